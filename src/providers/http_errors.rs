use std::error::Error as StdError;
use std::io::ErrorKind;

fn error_chain_matches(
    err: &(dyn StdError + 'static),
    kind: Option<ErrorKind>,
    needles: &[&str],
) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && Some(io_err.kind()) == kind
        {
            return true;
        }

        let text = source.to_string().to_ascii_lowercase();
        if needles.iter().any(|needle| text.contains(needle)) {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(err, Some(ErrorKind::ConnectionRefused), &["connection refused"])
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(err, Some(ErrorKind::TimedOut), &["timed out"])
}

fn error_chain_has_certificate_failure(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(err, None, &["certificate", "unknownissuer"])
}

fn error_chain_has_dns_failure(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(
        err,
        None,
        &["dns error", "failed to lookup address", "name or service not known"],
    )
}

/// Wraps a transport failure in an actionable message, keeping the reqwest error as its cause.
pub(crate) fn endpoint_request_error(
    err: reqwest::Error,
    endpoint_url: &str,
    timeout_secs: Option<u64>,
) -> anyhow::Error {
    let hint = request_error_hint(&err, endpoint_url, timeout_secs);
    anyhow::Error::new(err).context(hint)
}

fn request_error_hint(
    err: &reqwest::Error,
    endpoint_url: &str,
    timeout_secs: Option<u64>,
) -> String {
    if err.is_timeout() || error_chain_has_timeout(err) {
        let limit = timeout_secs
            .map(|secs| format!(" after {secs}s"))
            .unwrap_or_default();
        return format!(
            "Request to '{endpoint_url}' timed out{limit}. \
             Increase LLM_SHELL_TIMEOUT_SECS or check endpoint responsiveness."
        );
    }

    if err.is_builder() {
        return format!(
            "Invalid endpoint_url '{endpoint_url}'. Pass a full URL with --endpoint_url."
        );
    }

    if err.is_connect() {
        if error_chain_has_certificate_failure(err) {
            return format!(
                "TLS certificate verification failed for '{endpoint_url}'. If the endpoint uses a \
                 self-signed certificate, pass --insecure_skip_verify true."
            );
        }

        if error_chain_has_connection_refused(err) {
            return format!(
                "Connection refused by endpoint at '{endpoint_url}'. \
                 Ensure the service is running and endpoint_url is correct."
            );
        }

        if error_chain_has_dns_failure(err) {
            return format!(
                "Could not resolve the host of '{endpoint_url}'. Check endpoint_url and DNS settings."
            );
        }

        return format!(
            "Failed to connect to endpoint at '{endpoint_url}'. \
             Check endpoint_url and network connectivity."
        );
    }

    format!("Failed to call endpoint '{endpoint_url}'")
}
