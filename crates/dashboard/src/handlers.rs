//! API request handlers for dashboard operations

use access_gate::{GateStatus, SecurityLevel, Session};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use pharma_common::{address::shorten, Error, WalletError};
use serde::{Deserialize, Serialize};
use supply_ledger::{LedgerStats, NewProduct, Product};
use tracing::{info, warn};

use crate::service::OperationOutcome;
use crate::AppState;

/// Optional body for connecting a wallet
#[derive(Debug, Default, Deserialize)]
pub struct ConnectRequest {
    /// Wallet provider; the configured one when absent
    pub provider: Option<String>,
}

/// Query for listing products
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Case-insensitive match on id, name or batch number
    #[serde(default)]
    pub search: String,
}

/// Request to transfer a product
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub new_holder: String,
}

/// Request to log a temperature reading
#[derive(Debug, Deserialize)]
pub struct TemperatureRequest {
    /// Degrees Celsius
    pub temperature: f64,
    pub location: String,
}

/// Connected session as shown to the user
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub address: String,
    pub address_short: String,
    pub network: String,
    pub permissions: Vec<String>,
    pub security_level: SecurityLevel,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub ip_address: String,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            address_short: shorten(&session.address),
            security_level: session.security_level,
            address: session.address,
            network: session.network,
            permissions: session.permissions,
            connected_at: session.timestamp,
            last_activity: session.last_activity_timestamp,
            ip_address: session.ip_address,
        }
    }
}

/// Product with the display fields used by the dashboard
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,

    pub status_code: u8,
    pub status_label: &'static str,
    pub holder_short: String,

    /// Latest reading formatted as "22.5°C"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_temperature: Option<String>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            status_code: product.status.code(),
            status_label: product.status.label(),
            holder_short: shorten(&product.current_holder),
            latest_temperature: product
                .latest_reading()
                .map(|r| r.temperature.to_string()),
            product,
        }
    }
}

/// Response to a confirmed product operation
#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub message: String,
    pub transaction_hash: String,
    pub product: ProductView,
}

impl OperationResponse {
    fn new(message: impl Into<String>, outcome: OperationOutcome) -> Self {
        Self {
            message: message.into(),
            transaction_hash: outcome.transaction_hash,
            product: outcome.product.into(),
        }
    }
}

/// Product list response
#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub count: usize,
    pub products: Vec<ProductView>,
}

/// Dashboard counters and gate bookkeeping
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub ledger: LedgerStats,
    pub gate: GateStatus,
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.kind,
            "message": self.message,
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) | Error::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateId(_) | Error::OperationInFlight(_) => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::LockedOut { .. } => StatusCode::LOCKED,
            Error::SessionExpired | Error::NotConnected => StatusCode::UNAUTHORIZED,
            Error::Unauthorized => StatusCode::FORBIDDEN,
            Error::Wallet(WalletError::NotConnected) => StatusCode::UNAUTHORIZED,
            Error::Wallet(WalletError::UserRejected) => StatusCode::BAD_REQUEST,
            Error::Wallet(WalletError::InsufficientFunds) => StatusCode::PAYMENT_REQUIRED,
            Error::Wallet(WalletError::NotInstalled) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Wallet(WalletError::ApprovalTimeout) => StatusCode::GATEWAY_TIMEOUT,
            Error::Wallet(WalletError::Transaction(_)) => StatusCode::BAD_GATEWAY,
            Error::Storage(_) | Error::JsonSerialization(_) | Error::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            warn!("Request failed: {:#}", err);
        }

        ApiError {
            status,
            kind: err.kind(),
            message: err.user_message(),
        }
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "dashboard"
    }))
}

/// Connect the wallet and open a session
pub async fn connect_handler(
    State(state): State<AppState>,
    request: Option<Json<ConnectRequest>>,
) -> Result<Json<SessionResponse>, ApiError> {
    let provider = request.and_then(|Json(r)| r.provider);
    let session = state.connect(provider.as_deref()).await?;
    info!("Wallet connected: {}", shorten(&session.address));
    Ok(Json(session.into()))
}

/// Disconnect the wallet; succeeds when nothing is connected
pub async fn disconnect_handler(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.disconnect().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current session
pub async fn session_handler(
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.current_session().await.ok_or(Error::NotConnected)?;
    Ok(Json(session.into()))
}

/// List products, optionally filtered
pub async fn list_products_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<ProductsResponse> {
    let products: Vec<ProductView> = state
        .list_products(&params.search)
        .await
        .into_iter()
        .map(ProductView::from)
        .collect();

    Json(ProductsResponse {
        count: products.len(),
        products,
    })
}

/// Get one product
pub async fn get_product_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>, ApiError> {
    let product = state.get_product(&id).await?;
    Ok(Json(product.into()))
}

/// Create a product
pub async fn create_product_handler(
    State(state): State<AppState>,
    Json(request): Json<NewProduct>,
) -> Result<(StatusCode, Json<OperationResponse>), ApiError> {
    let outcome = state.create_product(request).await?;
    let message = format!("Product {} created successfully!", outcome.product.id);
    Ok((StatusCode::CREATED, Json(OperationResponse::new(message, outcome))))
}

/// Transfer a product to a new holder
pub async fn transfer_product_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<OperationResponse>, ApiError> {
    let outcome = state.transfer_product(&id, &request.new_holder).await?;
    let message = format!(
        "Product transferred successfully to {}. Status updated to \"{}\"",
        shorten(&outcome.product.current_holder),
        outcome.product.status.label()
    );
    Ok(Json(OperationResponse::new(message, outcome)))
}

/// Log a temperature reading
pub async fn log_temperature_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<TemperatureRequest>,
) -> Result<Json<OperationResponse>, ApiError> {
    let outcome = state
        .log_temperature(&id, request.temperature, &request.location)
        .await?;
    let message = match outcome.product.latest_reading() {
        Some(reading) => format!(
            "Temperature logged successfully: {} at {}",
            reading.temperature, reading.location
        ),
        None => "Temperature logged successfully".to_string(),
    };
    Ok(Json(OperationResponse::new(message, outcome)))
}

/// Verify compliance of a product
pub async fn verify_compliance_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OperationResponse>, ApiError> {
    let outcome = state.verify_compliance(&id).await?;
    Ok(Json(OperationResponse::new(
        "Compliance verified successfully!",
        outcome,
    )))
}

/// Dashboard metrics
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        ledger: state.stats().await,
        gate: state.gate_status().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_api_error_body() {
        let response = ApiError::from(Error::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let json = body_json(response).await;
        assert_eq!(json["error"], "unauthorized");
        assert_eq!(json["message"], "Unauthorized wallet address. Access denied.");
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::Validation("x".into()), StatusCode::BAD_REQUEST),
            (Error::DuplicateId("P1".into()), StatusCode::CONFLICT),
            (Error::NotFound("P1".into()), StatusCode::NOT_FOUND),
            (Error::OperationInFlight("P1".into()), StatusCode::CONFLICT),
            (Error::SessionExpired, StatusCode::UNAUTHORIZED),
            (Error::LockedOut { until: Utc::now() }, StatusCode::LOCKED),
            (WalletError::InsufficientFunds.into(), StatusCode::PAYMENT_REQUIRED),
            (Error::Storage("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }

    #[test]
    fn test_product_view_fields() {
        let product = Product {
            id: "P1".to_string(),
            name: "Aspirin".to_string(),
            batch_number: "B1".to_string(),
            manufacturing_date: Utc::now(),
            expiry_date: Utc::now(),
            manufacturer: "0x19d3828d73b632f813cdc5c3ef2823268b7001011992a003cb0ca02916a2021b"
                .to_string(),
            current_holder: "0x19d3828d73b632f813cdc5c3ef2823268b7001011992a003cb0ca02916a2021b"
                .to_string(),
            status: supply_ledger::ProductStatus::InTransit,
            temperature_log: vec![supply_ledger::TemperatureReading {
                timestamp: Utc::now(),
                temperature: supply_ledger::Temperature::from_hundredths(2250),
                location: "Warehouse".to_string(),
            }],
            compliance_verified: false,
        };

        let json = serde_json::to_value(ProductView::from(product)).unwrap();
        assert_eq!(json["id"], "P1");
        assert_eq!(json["status"], "in_transit");
        assert_eq!(json["status_code"], 2);
        assert_eq!(json["status_label"], "In Transit");
        assert_eq!(json["holder_short"], "0x19d3...021b");
        assert_eq!(json["latest_temperature"], "22.5°C");
    }
}
