//! Tour document rules: defaults, normalization and validation.
//!
//! Both insert and update funnel through [`build_tour`], so an update is
//! validated against the merged document rather than only the patched keys.

use chrono::{DateTime, Utc};

use crate::errors::{FieldError, Result, StoreError};
use crate::models::{parse_date, Difficulty, Tour, TourInput};

pub const NAME_MIN_LEN: usize = 10;
pub const NAME_MAX_LEN: usize = 40;
pub const RATING_MIN: f64 = 1.0;
pub const RATING_MAX: f64 = 5.0;
pub const DEFAULT_RATING: f64 = 4.5;

pub fn build_tour(input: TourInput, id: String, created_at: DateTime<Utc>) -> Result<Tour> {
    let mut errors = Vec::new();

    let name = trimmed(input.name);
    match &name {
        None => errors.push(FieldError::new("name", "A tour must have a name")),
        Some(n) => {
            let len = n.chars().count();
            if len > NAME_MAX_LEN {
                errors.push(FieldError::new("name", format!("A tour name must have less or equal then {NAME_MAX_LEN} characters")));
            } else if len < NAME_MIN_LEN {
                errors.push(FieldError::new("name", format!("A tour name must have more or equal then {NAME_MIN_LEN} characters")));
            }
        }
    }

    match input.duration {
        None => errors.push(FieldError::new("duration", "A tour must have a duration")),
        Some(d) if d <= 0.0 => errors.push(FieldError::new("duration", "Duration must be positive")),
        Some(_) => {}
    }

    match input.max_group_size {
        None => errors.push(FieldError::new("maxGroupSize", "A tour must have a group size")),
        Some(n) if n <= 0 => errors.push(FieldError::new("maxGroupSize", "Group size must be positive")),
        Some(_) => {}
    }

    let difficulty = match trimmed(input.difficulty) {
        None => {
            errors.push(FieldError::new("difficulty", "A tour must have a difficulty"));
            None
        }
        Some(s) => {
            let d = Difficulty::parse(&s);
            if d.is_none() {
                errors.push(FieldError::new("difficulty", "Difficulty is either: easy, medium, difficult"));
            }
            d
        }
    };

    let rating_average = input.rating_average.unwrap_or(DEFAULT_RATING);
    if rating_average < RATING_MIN {
        errors.push(FieldError::new("ratingAverage", "Rating must be above 1.0"));
    } else if rating_average > RATING_MAX {
        errors.push(FieldError::new("ratingAverage", "Rating must be below 5.0"));
    }

    let ratings_quantity = input.ratings_quantity.unwrap_or(0);
    if ratings_quantity < 0 {
        errors.push(FieldError::new("ratingsQuantity", "Ratings quantity cannot be negative"));
    }

    match input.price {
        None => errors.push(FieldError::new("price", "A tour must have a price")),
        Some(p) if p < 0.0 => errors.push(FieldError::new("price", "Price cannot be negative")),
        Some(_) => {}
    }

    if let (Some(discount), Some(price)) = (input.price_discount, input.price) {
        if discount >= price {
            errors.push(FieldError::new("priceDiscount", format!("Discount price ({discount}) should be below regular price")));
        }
    }

    let mut start_dates = Vec::new();
    for raw in input.start_dates.unwrap_or_default() {
        match parse_date(&raw) {
            Some(d) => start_dates.push(d),
            None => errors.push(FieldError::new("startDates", format!("Invalid start date: {raw}"))),
        }
    }

    // Every required field is known present once `errors` is empty.
    match (errors.is_empty(), name, difficulty, input.duration, input.max_group_size, input.price) {
        (true, Some(name), Some(difficulty), Some(duration), Some(max_group_size), Some(price)) => Ok(Tour {
            id,
            name,
            duration,
            max_group_size,
            difficulty,
            rating_average,
            ratings_quantity,
            price,
            price_discount: input.price_discount,
            summary: trimmed(input.summary),
            description: trimmed(input.description),
            image_cover: input.image_cover,
            images: input.images.unwrap_or_default(),
            start_dates,
            created_at,
        }),
        _ => Err(StoreError::Validation(errors)),
    }
}

fn trimmed(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> TourInput {
        TourInput {
            name: Some("  The Forest Hiker  ".into()),
            duration: Some(5.0),
            max_group_size: Some(25),
            difficulty: Some("easy".into()),
            price: Some(397.0),
            ..Default::default()
        }
    }

    fn fields(err: StoreError) -> Vec<&'static str> {
        match err {
            StoreError::Validation(errs) => errs.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn applies_defaults_and_trims() {
        let t = build_tour(valid(), "id1".into(), Utc::now()).unwrap();
        assert_eq!(t.name, "The Forest Hiker");
        assert_eq!(t.rating_average, DEFAULT_RATING);
        assert_eq!(t.ratings_quantity, 0);
        assert!(t.images.is_empty());
        assert!(t.start_dates.is_empty());
    }

    #[test]
    fn reports_every_missing_required_field() {
        let err = build_tour(TourInput::default(), "id".into(), Utc::now()).unwrap_err();
        assert_eq!(fields(err), vec!["name", "duration", "maxGroupSize", "difficulty", "price"]);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut input = valid();
        input.name = Some("Short".into());
        input.difficulty = Some("extreme".into());
        input.rating_average = Some(5.5);
        input.price_discount = Some(500.0);
        input.start_dates = Some(vec!["2021-04-25,10:00".into(), "soon".into()]);
        let err = build_tour(input, "id".into(), Utc::now()).unwrap_err();
        assert_eq!(fields(err), vec!["name", "difficulty", "ratingAverage", "priceDiscount", "startDates"]);
    }

    #[test]
    fn discount_below_price_is_accepted() {
        let mut input = valid();
        input.price_discount = Some(100.0);
        let t = build_tour(input, "id".into(), Utc::now()).unwrap();
        assert_eq!(t.price_discount, Some(100.0));
    }
}
