use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use natours_core::models::format_date;

/// Arrival time of the current request, echoed back as `requestTime`.
#[derive(Clone, Debug)]
pub struct RequestTime(pub String);

pub async fn stamp_request_time(mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(RequestTime(format_date(&Utc::now())));
    next.run(req).await
}
