use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    // A POST that timed out may still have been applied remotely.
    fn is_idempotent(self) -> bool {
        !matches!(self, Self::Post)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Body<'a> {
    pub(crate) content_type: &'a str,
    pub(crate) payload: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct HttpRequest<'a> {
    pub(crate) method: Method,
    pub(crate) url: &'a str,
    pub(crate) bearer: Option<&'a str>,
    pub(crate) query: &'a [(String, String)],
    pub(crate) body: Option<Body<'a>>,
}

#[derive(Debug, Clone)]
pub(crate) struct RetryPolicy {
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Duration,
    pub(crate) attempts: usize,
    pub(crate) retry_delay: Duration,
    pub(crate) max_retry_after: Duration,
}

impl RetryPolicy {
    pub(crate) fn new(timeout: Duration, attempts: usize) -> Self {
        Self {
            connect_timeout: timeout.min(Duration::from_secs(5)),
            read_timeout: timeout,
            attempts,
            retry_delay: Duration::from_millis(500),
            max_retry_after: Duration::from_secs(30),
        }
    }
}

fn should_retry_http_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..=599).contains(&status)
}

fn retry_after(response: &ureq::Response, policy: &RetryPolicy) -> Duration {
    response
        .header("Retry-After")
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(policy.max_retry_after))
        .unwrap_or(policy.retry_delay)
}

pub(crate) fn send_with_retries(
    request: &HttpRequest<'_>,
    policy: &RetryPolicy,
) -> Result<String, ApiError> {
    let attempts = if request.method.is_idempotent() {
        policy.attempts.max(1)
    } else {
        1
    };

    let agent = ureq::AgentBuilder::new()
        .timeout_connect(policy.connect_timeout)
        .timeout_read(policy.read_timeout)
        .timeout_write(policy.read_timeout)
        .build();

    for attempt in 1..=attempts {
        let mut call = agent.request(request.method.as_str(), request.url);
        if let Some(token) = request.bearer {
            call = call.set("Authorization", &format!("Bearer {token}"));
        }
        for (key, value) in request.query {
            call = call.query(key, value);
        }

        let result = match request.body {
            Some(body) => call
                .set("Content-Type", body.content_type)
                .send_string(body.payload),
            None => call.call(),
        };

        match result {
            Ok(response) => {
                return response.into_string().map_err(|err| ApiError::Transport {
                    detail: format!("response decode failed: {err}"),
                    attempts: attempt,
                });
            }
            Err(ureq::Error::Status(status, response)) => {
                let delay = retry_after(&response, policy);
                let response_body = response.into_string().ok().unwrap_or_default();
                let body = response_body.trim().chars().take(240).collect::<String>();

                if should_retry_http_status(status) && attempt < attempts {
                    debug!(
                        method = request.method.as_str(),
                        url = request.url,
                        status,
                        attempt,
                        "retrying after {delay:?}"
                    );
                    thread::sleep(delay);
                    continue;
                }

                return Err(ApiError::Status {
                    status,
                    body,
                    attempts: attempt,
                });
            }
            Err(ureq::Error::Transport(err)) => {
                if attempt < attempts {
                    debug!(
                        method = request.method.as_str(),
                        url = request.url,
                        attempt,
                        "transport error, retrying: {err}"
                    );
                    thread::sleep(policy.retry_delay);
                    continue;
                }
                return Err(ApiError::Transport {
                    detail: err.to_string(),
                    attempts: attempt,
                });
            }
        }
    }

    Err(ApiError::Transport {
        detail: "exhausted attempts without a concrete error".to_string(),
        attempts,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    pub(crate) enum Behavior {
        Respond(u16, String),
        RespondWithRetryAfter(u16, u64, String),
        DelayRespond(Duration, u16, String),
    }

    #[derive(Debug)]
    pub(crate) struct TestServer {
        pub(crate) base_url: String,
        requests: Arc<Mutex<Vec<String>>>,
        shutdown_tx: mpsc::Sender<()>,
        join_handle: Option<std::thread::JoinHandle<()>>,
    }

    impl TestServer {
        pub(crate) fn spawn(behaviors: Vec<Behavior>) -> Self {
            let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind test server");
            listener.set_nonblocking(true).expect("set nonblocking");
            let addr = listener.local_addr().expect("local addr");

            let requests = Arc::new(Mutex::new(Vec::new()));
            let requests_clone = Arc::clone(&requests);
            let shared_behaviors = Arc::new(Mutex::new(VecDeque::from(behaviors)));
            let behaviors_clone = Arc::clone(&shared_behaviors);
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

            let join_handle = std::thread::spawn(move || {
                loop {
                    if shutdown_rx.try_recv().is_ok() {
                        break;
                    }

                    match listener.accept() {
                        Ok((mut stream, _)) => {
                            let behavior = {
                                let mut queue = behaviors_clone.lock().expect("lock behaviors");
                                queue.pop_front().unwrap_or_else(|| {
                                    Behavior::Respond(200, "default-ok".to_string())
                                })
                            };
                            let requests = Arc::clone(&requests_clone);
                            let raw = consume_request(&mut stream).unwrap_or_default();
                            requests.lock().expect("lock requests").push(raw);
                            std::thread::spawn(move || {
                                serve_behavior(&mut stream, behavior);
                            });
                        }
                        Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                            std::thread::sleep(Duration::from_millis(5));
                        }
                        Err(_) => break,
                    }
                }
            });

            Self {
                base_url: format!("http://{addr}"),
                requests,
                shutdown_tx,
                join_handle: Some(join_handle),
            }
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().expect("lock requests").len()
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().expect("lock requests").clone()
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            let _ = self.shutdown_tx.send(());
            if let Some(handle) = self.join_handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn consume_request(stream: &mut TcpStream) -> std::io::Result<String> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(Duration::from_millis(200)))?;
        let mut buf = [0_u8; 1024];
        let mut data = Vec::new();
        let mut expected_len = None;
        loop {
            if let Some(total) = expected_len
                && data.len() >= total
            {
                break;
            }
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => {
                    data.extend_from_slice(&buf[..read]);
                    if expected_len.is_none()
                        && let Some(head_end) =
                            data.windows(4).position(|window| window == b"\r\n\r\n")
                    {
                        let head = String::from_utf8_lossy(&data[..head_end]).to_lowercase();
                        let body_len = head
                            .lines()
                            .find_map(|line| line.strip_prefix("content-length:"))
                            .and_then(|value| value.trim().parse::<usize>().ok())
                            .unwrap_or(0);
                        expected_len = Some(head_end + 4 + body_len);
                    }
                }
                Err(err)
                    if err.kind() == std::io::ErrorKind::WouldBlock
                        || err.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    fn reason_phrase(status: u16) -> &'static str {
        match status {
            200 => "OK",
            201 => "Created",
            400 => "Bad Request",
            404 => "Not Found",
            408 => "Request Timeout",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            503 => "Service Unavailable",
            _ => "Status",
        }
    }

    fn serve_behavior(stream: &mut TcpStream, behavior: Behavior) {
        match behavior {
            Behavior::Respond(status, body) => {
                let _ = write_response(stream, status, "", &body);
            }
            Behavior::RespondWithRetryAfter(status, secs, body) => {
                let _ = write_response(stream, status, &format!("Retry-After: {secs}\r\n"), &body);
            }
            Behavior::DelayRespond(delay, status, body) => {
                std::thread::sleep(delay);
                let _ = write_response(stream, status, "", &body);
            }
        }
    }

    fn write_response(
        stream: &mut TcpStream,
        status: u16,
        extra_headers: &str,
        body: &str,
    ) -> std::io::Result<()> {
        let reason = reason_phrase(status);
        let payload = body.as_bytes();
        write!(
            stream,
            "HTTP/1.1 {status} {reason}\r\n{extra_headers}Content-Length: {}\r\nConnection: close\r\n\r\n",
            payload.len()
        )?;
        stream.write_all(payload)?;
        stream.flush()
    }

    pub(crate) fn fast_policy(attempts: usize) -> RetryPolicy {
        RetryPolicy {
            connect_timeout: Duration::from_millis(200),
            read_timeout: Duration::from_millis(200),
            attempts,
            retry_delay: Duration::from_millis(1),
            max_retry_after: Duration::from_millis(1),
        }
    }

    fn get<'a>(url: &'a str, query: &'a [(String, String)]) -> HttpRequest<'a> {
        HttpRequest {
            method: Method::Get,
            url,
            bearer: Some("token-abc"),
            query,
            body: None,
        }
    }

    #[test]
    fn retries_retryable_statuses_until_success() {
        let server = TestServer::spawn(vec![
            Behavior::Respond(500, "server-error".to_string()),
            Behavior::Respond(429, "throttled".to_string()),
            Behavior::Respond(200, "ok".to_string()),
        ]);
        let query = vec![("q".to_string(), "x".to_string())];

        let result = send_with_retries(&get(&server.base_url, &query), &fast_policy(3));

        assert_eq!(result.expect("should eventually succeed"), "ok");
        assert_eq!(server.request_count(), 3);
    }

    #[test]
    fn does_not_retry_hard_client_errors() {
        let server = TestServer::spawn(vec![Behavior::Respond(404, "not-found".to_string())]);
        let query = vec![("q".to_string(), "x".to_string())];

        let result = send_with_retries(&get(&server.base_url, &query), &fast_policy(5));

        let err = result.expect_err("404 should not be retried");
        assert_eq!(err.status(), Some(404));
        assert!(
            err.to_string().contains("HTTP status 404"),
            "unexpected error message: {err}"
        );
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn retries_transport_timeout_and_recovers() {
        let server = TestServer::spawn(vec![
            Behavior::DelayRespond(Duration::from_millis(120), 200, "slow".to_string()),
            Behavior::Respond(200, "ok".to_string()),
        ]);
        let query = Vec::new();
        let mut policy = fast_policy(2);
        policy.connect_timeout = Duration::from_millis(250);
        policy.read_timeout = Duration::from_millis(20);

        let result = send_with_retries(&get(&server.base_url, &query), &policy);

        assert_eq!(result.expect("timeout should be retried"), "ok");
        assert_eq!(server.request_count(), 2);
    }

    #[test]
    fn returns_retry_exhausted_error_for_retryable_status() {
        let server = TestServer::spawn(vec![
            Behavior::Respond(503, "down".to_string()),
            Behavior::RespondWithRetryAfter(503, 7, "still-down".to_string()),
        ]);
        let query = Vec::new();

        let result = send_with_retries(&get(&server.base_url, &query), &fast_policy(2));

        let err = result.expect_err("retryable failures should eventually error");
        let message = err.to_string();
        assert!(
            message.contains("after 2 attempt(s)") && message.contains("HTTP status 503"),
            "unexpected error message: {message}"
        );
        assert_eq!(server.request_count(), 2);
    }

    #[test]
    fn post_is_attempted_once_even_when_retryable() {
        let server = TestServer::spawn(vec![
            Behavior::Respond(503, "down".to_string()),
            Behavior::Respond(201, "{}".to_string()),
        ]);
        let request = HttpRequest {
            method: Method::Post,
            url: &server.base_url,
            bearer: None,
            query: &[],
            body: Some(Body {
                content_type: "application/json",
                payload: "{\"name\":\"x\"}",
            }),
        };

        let err = send_with_retries(&request, &fast_policy(3)).expect_err("no retry for POST");
        assert_eq!(err.status(), Some(503));
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn sends_bearer_token_and_body() {
        let server = TestServer::spawn(vec![Behavior::Respond(200, "done".to_string())]);
        let request = HttpRequest {
            method: Method::Put,
            url: &server.base_url,
            bearer: Some("token-abc"),
            query: &[],
            body: Some(Body {
                content_type: "application/json",
                payload: "{\"uris\":[]}",
            }),
        };

        let body = send_with_retries(&request, &fast_policy(1)).expect("put should succeed");
        assert_eq!(body, "done");

        let requests = server.requests();
        let raw = requests.first().expect("one request recorded");
        assert!(raw.starts_with("PUT "), "unexpected request line: {raw}");
        assert!(raw.contains("Bearer token-abc"));
        assert!(raw.ends_with("{\"uris\":[]}"));
    }
}
