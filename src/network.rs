//! Network URL constants and helpers.

/// Default streaming quote endpoint.
pub const DEFAULT_WS_URL: &str = "wss://ws.finnhub.io";

/// Build the connection URL with the access token as a query parameter.
pub fn ws_url_with_token(base: &str, token: &str) -> String {
    format!("{}?token={}", base, urlencoding::encode(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_with_token() {
        assert_eq!(
            ws_url_with_token(DEFAULT_WS_URL, "abc123"),
            "wss://ws.finnhub.io?token=abc123"
        );
    }

    #[test]
    fn test_token_is_percent_encoded() {
        assert_eq!(
            ws_url_with_token("ws://127.0.0.1:9001", "a&b=c"),
            "ws://127.0.0.1:9001?token=a%26b%3Dc"
        );
    }
}
