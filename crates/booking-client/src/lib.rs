//! Booking Client - sends booking requests to the remote form endpoint.
//!
//! The endpoint is an opaque sink: the request is a single URL-encoded
//! `POST`, any response counts as success, and the response body is only
//! parsed as JSON for logging.
//!
//! ## Example
//!
//! ```no_run
//! use booking_client::{submit_booking, SubmissionClient, SubmitOutcome};
//! use booking_core::{BookingConfig, BookingSession};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = BookingConfig::default();
//!     let client = SubmissionClient::new("https://example.com/exec").unwrap();
//!     let mut session = BookingSession::from_config(&config);
//!
//!     match submit_booking(&mut session, &client).await {
//!         SubmitOutcome::Sent(receipt) => println!("sent ({})", receipt.status),
//!         SubmitOutcome::Disabled => println!("form incomplete"),
//!         SubmitOutcome::Failed { alert } => eprintln!("{alert}"),
//!     }
//! }
//! ```

pub mod error;

use std::time::{Duration, Instant};

use booking_core::{BookingRequest, BookingSession};
use reqwest::Url;
use tracing::{debug, info, warn};

pub use error::{Result, SubmitError};

/// Time allowed for one submission round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// What the endpoint answered.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    /// HTTP status code.
    pub status: u16,
    /// Response body, if it was valid JSON.
    pub body: Option<serde_json::Value>,
}

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The form was incomplete or already in flight; nothing was sent.
    Disabled,
    /// The request went through.
    Sent(SubmissionReceipt),
    /// The request failed; the form was kept for a retry.
    Failed {
        /// Text for the blocking alert.
        alert: &'static str,
    },
}

impl SubmitOutcome {
    pub fn was_sent(&self) -> bool {
        matches!(self, SubmitOutcome::Sent(_))
    }
}

/// HTTP client for the booking endpoint.
#[derive(Debug, Clone)]
pub struct SubmissionClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl SubmissionClient {
    /// Creates a client for the given endpoint.
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("clinic-booking/{}", env!("CARGO_PKG_VERSION")))
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Self::with_client(endpoint, client)
    }

    /// Creates a client reusing an existing reqwest client.
    pub fn with_client(endpoint: &str, client: reqwest::Client) -> Result<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Posts the request as `application/x-www-form-urlencoded`.
    ///
    /// Only transport errors fail; the status and body do not.
    pub async fn send(&self, request: &BookingRequest) -> Result<SubmissionReceipt> {
        debug!(endpoint = %self.endpoint, "Posting booking request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Booking endpoint returned a non-success status");
        }

        let body = match response.text().await {
            Ok(text) => match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(value) => {
                    debug!(response = %value, "Booking endpoint response");
                    Some(value)
                }
                Err(e) => {
                    debug!("Ignoring non-JSON response body: {}", e);
                    None
                }
            },
            Err(e) => {
                debug!("Ignoring unreadable response body: {}", e);
                None
            }
        };

        Ok(SubmissionReceipt {
            status: status.as_u16(),
            body,
        })
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint.trim())
        .map_err(|_| SubmitError::InvalidEndpoint(endpoint.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(SubmitError::InvalidEndpoint(endpoint.to_string())),
    }
}

/// Runs one submit attempt for the session.
///
/// Does nothing if the form cannot be submitted. On success the form is
/// cleared and the confirmation overlay opened; on failure the form is kept.
pub async fn submit_booking(session: &mut BookingSession, client: &SubmissionClient) -> SubmitOutcome {
    let Some(request) = session.prepare_submission() else {
        debug!("Submit ignored: form incomplete or already in flight");
        return SubmitOutcome::Disabled;
    };

    match client.send(&request).await {
        Ok(receipt) => {
            info!(status = receipt.status, "Booking sent");
            session.submission_succeeded(Instant::now());
            SubmitOutcome::Sent(receipt)
        }
        Err(e) => {
            let alert = session.submission_failed(&e);
            SubmitOutcome::Failed { alert }
        }
    }
}
