use natours_core::{Difficulty, Features, StoreError, TourQuery, TourStore};
use serde_json::{json, Value};

fn store() -> TourStore {
    TourStore::open_in_memory().expect("open in-memory store")
}

fn tour(name: &str, difficulty: &str, rating: f64, price: f64) -> Value {
    json!({
        "name": name,
        "duration": 5,
        "maxGroupSize": 10,
        "difficulty": difficulty,
        "ratingAverage": rating,
        "price": price,
    })
}

fn list(store: &TourStore, pairs: &[(&str, &str)]) -> Vec<Value> {
    let query = TourQuery::from_pairs(pairs.iter().copied());
    let features = Features::new(&query).filter().unwrap().sort().limit_fields().unwrap().paginate();
    store.find(&features).unwrap()
}

fn names(docs: &[Value]) -> Vec<&str> {
    docs.iter().map(|d| d["name"].as_str().unwrap()).collect()
}

#[test]
fn create_then_find_round_trips() {
    let s = store();
    let created = s.create(json!({
        "name": "The Forest Hiker",
        "duration": 5,
        "maxGroupSize": 25,
        "difficulty": "easy",
        "price": 397,
        "summary": "  Breathtaking hike  ",
        "startDates": ["2021-04-25,10:00", "2021-07-20T09:00:00Z"],
        "unknownField": true
    }))
    .unwrap();
    assert_eq!(created.id.len(), 32);
    assert_eq!(created.summary.as_deref(), Some("Breathtaking hike"));

    let found = s.find_by_id(&created.id).unwrap().expect("stored");
    assert_eq!(found, created);
    assert_eq!(serde_json::to_value(&found).unwrap()["startDates"], json!(["2021-04-25T10:00:00.000Z", "2021-07-20T09:00:00.000Z"]));
}

#[test]
fn invalid_body_is_not_stored() {
    let s = store();
    let err = s.create(json!({"name": "Too short", "price": 10})).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    let err = s.create(json!({"name": "The Forest Hiker", "price": "a lot"})).unwrap_err();
    assert!(matches!(err, StoreError::Body(_)));
    assert_eq!(s.count().unwrap(), 0);
}

#[test]
fn non_object_bodies_are_rejected() {
    let s = store();
    for body in [json!(["The Forest Hiker", 5, 25, "easy", 397]), json!("The Forest Hiker"), json!(42)] {
        let err = s.create(body).unwrap_err();
        assert!(matches!(err, StoreError::Body(_)), "{err:?}");
    }
    assert_eq!(s.count().unwrap(), 0);
}

#[test]
fn default_listing_puts_later_inserts_first() {
    let s = store();
    let bodies = vec![
        tour("The Forest Hiker", "easy", 4.7, 397.0),
        tour("The Sea Explorer", "medium", 4.8, 497.0),
        tour("The Snow Adventurer", "difficult", 4.5, 997.0),
    ];
    assert_eq!(s.insert_many(bodies).unwrap(), 3);
    assert_eq!(names(&list(&s, &[])), vec!["The Snow Adventurer", "The Sea Explorer", "The Forest Hiker"]);
}

#[test]
fn duplicate_name_is_reported() {
    let s = store();
    s.create(tour("The Forest Hiker", "easy", 4.7, 397.0)).unwrap();
    let err = s.create(tour("The Forest Hiker", "medium", 4.0, 100.0)).unwrap_err();
    match err {
        StoreError::Duplicate { field, value } => {
            assert_eq!(field, "name");
            assert_eq!(value, "The Forest Hiker");
        }
        other => panic!("expected duplicate, got {other:?}"),
    }
}

#[test]
fn update_merges_and_revalidates() {
    let s = store();
    let created = s.create(tour("The Forest Hiker", "easy", 4.7, 397.0)).unwrap();

    let updated = s.update_by_id(&created.id, json!({"price": 500, "_id": "hijack"})).unwrap().expect("exists");
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.price, 500.0);
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(s.find_by_id(&created.id).unwrap().unwrap(), updated);

    // discount is checked against the merged price, not only the patched keys
    let err = s.update_by_id(&created.id, json!({"priceDiscount": 600})).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(s.find_by_id(&created.id).unwrap().unwrap().price_discount, None);

    assert!(s.update_by_id("missing", json!({"price": 1})).unwrap().is_none());
}

#[test]
fn delete_returns_removed_document() {
    let s = store();
    let created = s.create(tour("The Forest Hiker", "easy", 4.7, 397.0)).unwrap();
    let removed = s.delete_by_id(&created.id).unwrap().expect("removed");
    assert_eq!(removed.id, created.id);
    assert!(s.find_by_id(&created.id).unwrap().is_none());
    assert!(s.delete_by_id(&created.id).unwrap().is_none());
}

#[test]
fn list_filters_sorts_projects_and_pages() {
    let s = store();
    s.create(tour("The Forest Hiker", "easy", 4.7, 397.0)).unwrap();
    s.create(tour("The Sea Explorer", "medium", 4.8, 497.0)).unwrap();
    s.create(tour("The Snow Adventurer", "difficult", 4.5, 997.0)).unwrap();
    s.create(tour("The City Wanderer", "easy", 4.6, 1197.0)).unwrap();

    // default sort is newest first
    assert_eq!(list(&s, &[]).len(), 4);

    let cheap = list(&s, &[("price[lt]", "1000"), ("sort", "-price")]);
    assert_eq!(names(&cheap), vec!["The Snow Adventurer", "The Sea Explorer", "The Forest Hiker"]);

    let easy = list(&s, &[("difficulty", "easy"), ("sort", "price"), ("fields", "name,price")]);
    assert_eq!(names(&easy), vec!["The Forest Hiker", "The City Wanderer"]);
    let keys: Vec<&String> = easy[0].as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 3);
    assert!(easy[0].get("_id").is_some());

    let page2 = list(&s, &[("sort", "price"), ("limit", "2"), ("page", "2")]);
    assert_eq!(names(&page2), vec!["The Snow Adventurer", "The City Wanderer"]);

    assert!(list(&s, &[("price[gt]", "5000")]).is_empty());
}

#[test]
fn top_five_cheap_view() {
    let s = store();
    for (i, price) in [900.0, 100.0, 500.0, 300.0, 700.0, 200.0].into_iter().enumerate() {
        s.create(tour(&format!("Tour number {i:02}"), "easy", 4.5, price)).unwrap();
    }
    let query = TourQuery::top_five_cheap();
    let features = Features::new(&query).filter().unwrap().sort().limit_fields().unwrap().paginate();
    let docs = s.find(&features).unwrap();
    let prices: Vec<f64> = docs.iter().map(|d| d["price"].as_f64().unwrap()).collect();
    assert_eq!(prices, vec![100.0, 200.0, 300.0, 500.0, 700.0]);
    for d in &docs {
        let mut keys: Vec<&str> = d.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["_id", "difficulty", "name", "price", "ratingAverage"]);
    }
}

#[test]
fn stats_group_rated_tours_by_difficulty() {
    let s = store();
    s.create(tour("Low rated easy tour", "easy", 3.0, 100.0)).unwrap();
    s.create(tour("Well rated easy tour", "easy", 4.0, 200.0)).unwrap();
    s.create(tour("Top rated medium tour", "medium", 5.0, 100.0)).unwrap();
    s.create(tour("Good rated medium tour", "medium", 4.0, 200.0)).unwrap();

    let stats = s.tour_stats().unwrap();
    assert_eq!(stats.len(), 2);

    let medium = &stats[0];
    assert_eq!(medium.difficulty, Difficulty::Medium);
    assert_eq!(medium.num_tours, 2);
    assert_eq!(medium.num_rating, 9.0);
    assert_eq!(medium.avg_rating, 4.5);
    assert_eq!(medium.avg_price, 150.0);
    assert_eq!((medium.min_price, medium.max_price), (100.0, 200.0));

    let easy = &stats[1];
    assert_eq!(easy.difficulty, Difficulty::Easy);
    assert_eq!(easy.num_tours, 1);
    assert_eq!(easy.avg_price, 200.0);
    assert_eq!((easy.min_price, easy.max_price), (200.0, 200.0));
}

#[test]
fn monthly_plan_unwinds_start_dates_within_year() {
    let s = store();
    let mut a = tour("The Forest Hiker", "easy", 4.7, 397.0);
    a["startDates"] = json!(["2021-03-21,10:00", "2021-07-01", "2022-03-01"]);
    let mut b = tour("The Sea Explorer", "medium", 4.8, 497.0);
    b["startDates"] = json!(["2021-03-10", "2021-12-15", "2021-12-01"]);
    let mut c = tour("The Snow Adventurer", "difficult", 4.5, 997.0);
    c["startDates"] = json!(["2020-12-31T23:59:59Z"]);
    s.insert_many(vec![a, b, c]).unwrap();

    let plan = s.monthly_plan(2021).unwrap();
    let months: Vec<u32> = plan.iter().map(|p| p.month).collect();
    assert_eq!(months, vec![3, 7, 12]);
    assert_eq!(plan[0].tours, vec!["The Forest Hiker", "The Sea Explorer"]);
    assert_eq!(plan[0].num_tour_starts, 2);
    assert_eq!(plan[1].tours, vec!["The Forest Hiker"]);
    // December 1st at midnight is the last instant inside the window
    assert_eq!(plan[2].tours, vec!["The Sea Explorer"]);

    assert!(s.monthly_plan(1999).unwrap().is_empty());
}

#[test]
fn insert_many_is_all_or_nothing() {
    let s = store();
    let err = s.insert_many(vec![tour("The Forest Hiker", "easy", 4.7, 397.0), json!({"name": "x"})]).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(s.count().unwrap(), 0);
    assert_eq!(s.delete_all().unwrap(), 0);
}
