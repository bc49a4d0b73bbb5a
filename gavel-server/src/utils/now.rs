use axum::{extract::FromRequestParts, http::request::Parts};
use time::OffsetDateTime;

/// The UTC instant a request entered the engine, as an extractor.
///
/// Every side effect of one request (the ledger entry, the published
/// event, the recorded notifications) is stamped with this single
/// timestamp, taken once at the edge rather than re-read mid-handler.
pub struct Now(pub OffsetDateTime);

impl<S> FromRequestParts<S> for Now
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(_: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        Ok(Now(OffsetDateTime::now_utc()))
    }
}
