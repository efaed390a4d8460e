use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::admin::{ClaimantQuery, ClaimantStanding, NewClaimant};
use super::context::{CallerContext, CallerRole};
use super::distance::DistanceEstimator;
use super::domain::{ClaimantId, DonationId, DonationStatus, RequestId};
use super::donor::{DonationQuery, NewDonation};
use super::error::{DonationError, ErrorKind};
use super::repository::DonationStore;
use super::service::DonationService;

/// Header carrying the authenticated caller id, set by the upstream auth layer.
pub const CALLER_ID_HEADER: &str = "x-caller-id";
/// Header carrying the caller role (`DONOR`, `NGO` or `ADMIN`).
pub const CALLER_ROLE_HEADER: &str = "x-caller-role";

type SharedService<S, D> = Arc<DonationService<S, D>>;

/// Router builder exposing the donor, claimant and admin endpoints.
pub fn donation_router<S, D>(service: SharedService<S, D>) -> Router
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    Router::new()
        .route("/api/ngo/overview", get(ngo_overview_handler::<S, D>))
        .route("/api/ngo/dashboard", get(ngo_dashboard_handler::<S, D>))
        .route("/api/ngo/browse", get(ngo_browse_handler::<S, D>))
        .route("/api/ngo/claim/:donation_id", post(claim_handler::<S, D>))
        .route("/api/ngo/requests", get(active_requests_handler::<S, D>))
        .route("/api/ngo/verify/:request_id", post(verify_handler::<S, D>))
        .route(
            "/api/donor/donations",
            post(create_donation_handler::<S, D>).get(donor_donations_handler::<S, D>),
        )
        .route("/api/donor/overview", get(donor_overview_handler::<S, D>))
        .route("/api/donor/dashboard", get(donor_dashboard_handler::<S, D>))
        .route(
            "/api/admin/claimants",
            get(list_claimants_handler::<S, D>).post(register_claimant_handler::<S, D>),
        )
        .route(
            "/api/admin/claimants/:claimant_id",
            get(claimant_detail_handler::<S, D>),
        )
        .route(
            "/api/admin/claimants/:claimant_id/verify",
            post(verify_claimant_handler::<S, D>),
        )
        .route(
            "/api/admin/claimants/:claimant_id/suspend",
            post(suspend_claimant_handler::<S, D>),
        )
        .route("/api/admin/overview", get(admin_overview_handler::<S, D>))
        .with_state(service)
}

/// Read the caller identity injected by the auth layer.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<CallerContext, DonationError> {
    let caller_id = headers
        .get(CALLER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|id| *id > 0)
        .ok_or(DonationError::Unauthenticated)?;
    let role = headers
        .get(CALLER_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(CallerRole::parse)
        .ok_or(DonationError::Unauthenticated)?;

    Ok(CallerContext { caller_id, role })
}

fn parse_id(raw: &str, field: &str) -> Result<u64, DonationError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| DonationError::invalid(format!("{field} must be a positive integer")))
}

pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::VerificationFailed | ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, DonationError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| DonationError::invalid(rejection.body_text()))
}

fn failure(err: DonationError) -> Response {
    let status = status_for(err.kind());
    if status == StatusCode::SERVICE_UNAVAILABLE {
        error!(error = %err, "donation store failure");
    }
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

fn respond<T: Serialize>(
    status: StatusCode,
    message: &str,
    result: Result<T, DonationError>,
) -> Response {
    match result {
        Ok(data) => {
            let payload = json!({ "message": message, "data": data });
            (status, Json(payload)).into_response()
        }
        Err(err) => failure(err),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BrowseParams {
    #[serde(default)]
    search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DonorListParams {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    page: Option<String>,
}

impl DonorListParams {
    fn into_query(self) -> Result<DonationQuery, DonationError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) if raw.eq_ignore_ascii_case("ALL") => None,
            Some(raw) => Some(DonationStatus::parse(raw).ok_or_else(|| {
                DonationError::invalid(format!("unknown donation status '{raw}'"))
            })?),
        };
        let page = self
            .page
            .as_deref()
            .map(|raw| parse_id(raw, "page"))
            .transpose()?
            .map(|page| page as usize);

        Ok(DonationQuery {
            search: self.search,
            status,
            page,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClaimantListParams {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl ClaimantListParams {
    fn into_query(self) -> Result<ClaimantQuery, DonationError> {
        let standing = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(ClaimantStanding::parse(raw).ok_or_else(|| {
                DonationError::invalid(format!("unknown claimant status '{raw}'"))
            })?),
        };
        Ok(ClaimantQuery {
            search: self.search,
            standing,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimReceipt {
    request_id: RequestId,
    donation_id: DonationId,
}

pub(crate) async fn ngo_overview_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| service.overview(&ctx));
    respond(StatusCode::OK, "NGO overview", result)
}

pub(crate) async fn ngo_dashboard_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| service.dashboard(&ctx));
    respond(StatusCode::OK, "NGO dashboard", result)
}

pub(crate) async fn ngo_browse_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
    Query(params): Query<BrowseParams>,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let search = params.search.unwrap_or_default();
    let result = caller_from_headers(&headers).and_then(|ctx| service.browse(&ctx, &search));
    respond(StatusCode::OK, "Food marketplace", result)
}

pub(crate) async fn claim_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
    Path(donation_id): Path<String>,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| {
        let donation_id = DonationId(parse_id(&donation_id, "donation id")?);
        let request_id = service.claim(&ctx, donation_id)?;
        Ok(ClaimReceipt {
            request_id,
            donation_id,
        })
    });
    respond(StatusCode::CREATED, "Donation claimed", result)
}

pub(crate) async fn active_requests_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result =
        caller_from_headers(&headers).and_then(|ctx| service.list_active_requests(&ctx));
    respond(StatusCode::OK, "Active requests", result)
}

pub(crate) async fn verify_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| {
        let request_id = RequestId(parse_id(&request_id, "request id")?);
        service.verify_pickup(&ctx, request_id)
    });
    respond(StatusCode::OK, "Pickup verified", result)
}

pub(crate) async fn create_donation_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
    body: Result<Json<NewDonation>, JsonRejection>,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| {
        let submission = json_body(body)?;
        service.create_donation(&ctx, submission)
    });
    respond(StatusCode::CREATED, "Donation created successfully", result)
}

pub(crate) async fn donor_donations_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
    Query(params): Query<DonorListParams>,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| {
        let query = params.into_query()?;
        service.donor_donations(&ctx, query)
    });
    respond(StatusCode::OK, "Donations fetched", result)
}

pub(crate) async fn donor_overview_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| service.donor_overview(&ctx));
    respond(StatusCode::OK, "Donor overview loaded", result)
}

pub(crate) async fn donor_dashboard_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| service.donor_dashboard(&ctx));
    respond(StatusCode::OK, "Dashboard data", result)
}

pub(crate) async fn list_claimants_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
    Query(params): Query<ClaimantListParams>,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| {
        let query = params.into_query()?;
        service.list_claimants(&ctx, &query)
    });
    respond(StatusCode::OK, "Claimant list", result)
}

pub(crate) async fn register_claimant_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
    body: Result<Json<NewClaimant>, JsonRejection>,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| {
        let submission = json_body(body)?;
        service.register_claimant(&ctx, submission)
    });
    respond(StatusCode::CREATED, "Claimant registered", result)
}

pub(crate) async fn claimant_detail_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
    Path(claimant_id): Path<String>,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| {
        let id = ClaimantId(parse_id(&claimant_id, "claimant id")?);
        service.claimant_detail(&ctx, id)
    });
    respond(StatusCode::OK, "Claimant details", result)
}

pub(crate) async fn verify_claimant_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
    Path(claimant_id): Path<String>,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| {
        let id = ClaimantId(parse_id(&claimant_id, "claimant id")?);
        service.verify_claimant(&ctx, id)
    });
    respond(StatusCode::OK, "Claimant verified", result)
}

pub(crate) async fn suspend_claimant_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
    Path(claimant_id): Path<String>,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| {
        let id = ClaimantId(parse_id(&claimant_id, "claimant id")?);
        service.suspend_claimant(&ctx, id)
    });
    respond(StatusCode::OK, "Claimant suspended", result)
}

pub(crate) async fn admin_overview_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    headers: HeaderMap,
) -> Response
where
    S: DonationStore + 'static,
    D: DistanceEstimator + 'static,
{
    let result = caller_from_headers(&headers).and_then(|ctx| service.admin_overview(&ctx));
    respond(StatusCode::OK, "Admin system overview", result)
}
