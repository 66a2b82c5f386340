//! Authenticated access to CETESB's QualAr export service.

use crate::observations::error::ObservationError;
use crate::observations::source::ObservationSource;
use crate::observations::table_parser::{parse_results_page, Reading};
use crate::types::date_window::DateWindow;
use crate::types::parameter::Parameter;
use crate::types::station::StationCode;
use log::{info, warn};
use reqwest::Client;
use std::fmt;
use tokio::sync::OnceCell;

const LOGIN_URL: &str = "https://qualar.cetesb.sp.gov.br/qualar/autenticador";
const QUERY_URL: &str = "https://qualar.cetesb.sp.gov.br/qualar/exportaDados.do?method=pesquisar";

pub const LOGIN_ENV: &str = "QUALAR_LOGIN";
pub const PASSWORD_ENV: &str = "QUALAR_PASSWORD";

/// QualAr account credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    login: String,
    password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Reads `QUALAR_LOGIN` and `QUALAR_PASSWORD`.
    pub fn from_env() -> Result<Self, ObservationError> {
        let login =
            std::env::var(LOGIN_ENV).map_err(|_| ObservationError::MissingCredential(LOGIN_ENV))?;
        let password = std::env::var(PASSWORD_ENV)
            .map_err(|_| ObservationError::MissingCredential(PASSWORD_ENV))?;
        Ok(Self::new(login, password))
    }

    pub fn login(&self) -> &str {
        &self.login
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

/// QualAr session. Logs in on first use; the session cookie is kept by the
/// client's cookie store for later queries.
#[derive(Debug)]
pub struct QualarClient {
    client: Client,
    credentials: Credentials,
    session: OnceCell<()>,
}

impl QualarClient {
    pub fn new(credentials: Credentials) -> Result<Self, ObservationError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(ObservationError::ClientBuild)?;
        Ok(Self {
            client,
            credentials,
            session: OnceCell::new(),
        })
    }

    async fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<String, ObservationError> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| ObservationError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    ObservationError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    ObservationError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        response
            .text()
            .await
            .map_err(|e| ObservationError::NetworkRequest(url.to_string(), e))
    }

    async fn login(&self) -> Result<(), ObservationError> {
        info!("Logging in to QualAr as {}", self.credentials.login);
        self.post_form(
            LOGIN_URL,
            &[
                ("cetesb_login", self.credentials.login.clone()),
                ("cetesb_password", self.credentials.password.clone()),
            ],
        )
        .await?;
        Ok(())
    }
}

impl ObservationSource for QualarClient {
    async fn hourly_values(
        &self,
        station: StationCode,
        parameter: Parameter,
        window: &DateWindow,
    ) -> Result<Vec<Reading>, ObservationError> {
        self.session.get_or_try_init(|| self.login()).await?;

        info!(
            "Downloading {} for station {} from {}",
            parameter, station, window
        );
        let body = self
            .post_form(
                QUERY_URL,
                &[
                    ("irede", "A".to_string()),
                    ("dataInicialStr", window.query_start()),
                    ("dataFinalStr", window.query_end()),
                    ("iTipoDado", "P".to_string()),
                    ("estacaoVO.nestcaMonto", station.to_string()),
                    ("parametroVO.nparmt", parameter.code().to_string()),
                ],
            )
            .await?;
        parse_results_page(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_password() {
        let credentials = Credentials::new("user@example.com", "hunter2");
        let shown = format!("{credentials:?}");
        assert!(shown.contains("user@example.com"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn test_client_builds_with_cookie_store() {
        assert!(QualarClient::new(Credentials::new("a", "b")).is_ok());
    }
}
