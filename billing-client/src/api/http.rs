use reqwest::{Client, Response};

use super::{ApiError, CustomerDirectory, MonthReadingProvider};
use crate::domain::{CustomerId, DailyReadings, MonthKey, PayloadError};

const CUSTOMERS_PATH: &str = "/api/customers";
const DAILY_READINGS_PATH: &str = "/api/daily-readings";
const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// REST client for the billing API.
///
/// The API sits behind a form login; the session cookie obtained by
/// [`HttpApiClient::login`] is kept in the client's cookie store.
#[derive(Clone)]
pub struct HttpApiClient {
    base_url: String,
    client: Client,
    credentials: Option<Credentials>,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>, credentials: Option<Credentials>) -> Result<Self, ApiError> {
        let client = Client::builder().cookie_store(true).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            base_url,
            client,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log in with the configured credentials. A no-op without credentials.
    pub async fn login(&self) -> Result<(), ApiError> {
        let Some(creds) = &self.credentials else {
            return Ok(());
        };

        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        let response = self
            .client
            .post(&url)
            .form(&[("username", creds.username.as_str()), ("password", creds.password.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(user = %creds.username, "logged in to billing API");
            Ok(())
        } else {
            tracing::warn!(status = status.as_u16(), "billing API login rejected");
            Err(ApiError::LoginRejected(status.as_u16()))
        }
    }

    async fn body_text(endpoint: &str, response: Response) -> Result<String, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait::async_trait]
impl CustomerDirectory for HttpApiClient {
    async fn list_customers(&self) -> Result<Vec<CustomerId>, ApiError> {
        let url = format!("{}{}", self.base_url, CUSTOMERS_PATH);
        tracing::debug!(%url, "fetching customer list");

        let response = self.client.get(&url).send().await?;
        let body = Self::body_text(CUSTOMERS_PATH, response).await?;

        let ids: Vec<CustomerId> = serde_json::from_str(&body).map_err(|e| ApiError::Malformed {
            endpoint: CUSTOMERS_PATH.to_string(),
            source: PayloadError::Json(e),
        })?;

        Ok(ids.into_iter().filter(|id| !id.is_empty()).collect())
    }
}

#[async_trait::async_trait]
impl MonthReadingProvider for HttpApiClient {
    async fn fetch_month(
        &self,
        customer: &CustomerId,
        month: MonthKey,
    ) -> Result<DailyReadings, ApiError> {
        let url = format!("{}{}", self.base_url, DAILY_READINGS_PATH);
        tracing::debug!(%customer, %month, "fetching daily readings");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("customer_id", customer.as_str().to_string()),
                ("year", month.year().to_string()),
                ("month", month.month().to_string()),
            ])
            .send()
            .await?;
        let body = Self::body_text(DAILY_READINGS_PATH, response).await?;

        DailyReadings::from_json(&body).map_err(|source| ApiError::Malformed {
            endpoint: DAILY_READINGS_PATH.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let client = HttpApiClient::new("http://localhost:5000/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
