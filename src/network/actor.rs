//! Network actor - runs API calls in the Tokio async runtime

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::messages::network::Operation;
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::network::client::ApiClient;

/// Network actor that turns commands into API calls.
///
/// Each call is an independent task: no retries, no cancellation, no
/// deduplication. Results are reported back in completion order.
pub struct NetworkActor {
    client: ApiClient,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<()>,
}

impl NetworkActor {
    pub fn new(client: ApiClient, response_tx: mpsc::UnboundedSender<NetworkResponse>) -> Self {
        NetworkActor {
            client,
            response_tx,
            active_requests: JoinSet::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::Shutdown) | None => {
                            self.active_requests.abort_all();
                            break;
                        }
                        Some(cmd) => self.spawn(cmd),
                    }
                }

                // Reap finished tasks
                Some(result) = self.active_requests.join_next() => {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "API task ended abnormally");
                    }
                }
            }
        }
    }

    fn spawn(&mut self, cmd: NetworkCommand) {
        let client = self.client.clone();
        let response_tx = self.response_tx.clone();
        self.active_requests.spawn(async move {
            if let Some(response) = execute(&client, cmd).await {
                let _ = response_tx.send(response);
            }
        });
    }
}

/// Perform one command against the API and wrap the outcome.
/// `Shutdown` carries no call and yields nothing.
pub async fn execute(client: &ApiClient, cmd: NetworkCommand) -> Option<NetworkResponse> {
    let token = cmd.token().map(str::to_owned);
    let token = token.as_deref();

    let (id, operation, result) = match cmd {
        NetworkCommand::Login { id, credentials } => {
            tracing::info!(id, username = %credentials.username, "Logging in");
            let result = client
                .login(&credentials)
                .await
                .map(|token| NetworkResponse::LoggedIn { id, token });
            (id, Operation::Login, result)
        }
        NetworkCommand::Register { id, registration } => {
            tracing::info!(id, username = %registration.username, is_admin = registration.is_admin, "Registering");
            let result = client
                .register(&registration)
                .await
                .map(|is_admin| NetworkResponse::Registered { id, is_admin });
            (id, Operation::Register, result)
        }
        NetworkCommand::FetchWineries { id, .. } => {
            tracing::info!(id, "Fetching all wineries");
            let result = client
                .list_wineries(token)
                .await
                .map(|wineries| NetworkResponse::Wineries { id, wineries });
            (id, Operation::FetchWineries, result)
        }
        NetworkCommand::SearchWineries { id, query, .. } => {
            tracing::info!(id, name = %query.name, min_rating = query.min_rating, regions = query.regions.len(), "Searching wineries");
            let result = client
                .search_wineries(token, &query)
                .await
                .map(|wineries| NetworkResponse::Wineries { id, wineries });
            (id, Operation::SearchWineries, result)
        }
        NetworkCommand::CreateWinery { id, winery, .. } => {
            tracing::info!(id, name = %winery.name, "Creating winery");
            let result = client
                .create_winery(token, &winery)
                .await
                .map(|winery| NetworkResponse::WineryCreated { id, winery });
            (id, Operation::CreateWinery, result)
        }
        NetworkCommand::RateWinery { id, winery_id, rating, .. } => {
            tracing::info!(id, winery_id, rating, "Submitting rating");
            let result = client
                .rate_winery(token, winery_id, rating)
                .await
                .map(|average_rating| NetworkResponse::RatingAccepted {
                    id,
                    winery_id,
                    average_rating,
                });
            (id, Operation::RateWinery(winery_id), result)
        }
        NetworkCommand::Shutdown => return None,
    };

    match result {
        Ok(response) => {
            tracing::info!(id, operation = operation.as_str(), "Request completed");
            Some(response)
        }
        Err(e) => {
            tracing::error!(id, operation = operation.as_str(), error = %format!("{:#}", e), "Request failed");
            Some(NetworkResponse::Error {
                id,
                operation,
                message: format!("{:#}", e),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Credentials;
    use crate::storage::Settings;

    fn unreachable_client() -> ApiClient {
        // Bind then drop to get a port nobody listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        ApiClient::new(&Settings {
            api_base_url: format!("http://127.0.0.1:{}", port),
            request_timeout_secs: 2,
        })
    }

    #[tokio::test]
    async fn test_failure_is_reported_with_operation() {
        let client = unreachable_client();
        let response = execute(
            &client,
            NetworkCommand::RateWinery {
                id: 7,
                token: Some("t".into()),
                winery_id: 3,
                rating: 4,
            },
        )
        .await
        .unwrap();
        match response {
            NetworkResponse::Error { id, operation, .. } => {
                assert_eq!(id, 7);
                assert_eq!(operation, Operation::RateWinery(3));
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_failure_and_shutdown() {
        let client = unreachable_client();
        let response = execute(
            &client,
            NetworkCommand::Login {
                id: 1,
                credentials: Credentials {
                    username: "u".into(),
                    password: "p".into(),
                },
            },
        )
        .await;
        assert!(matches!(
            response,
            Some(NetworkResponse::Error { operation: Operation::Login, .. })
        ));
        assert!(execute(&client, NetworkCommand::Shutdown).await.is_none());
    }
}
