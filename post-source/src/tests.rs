#[cfg(test)]
mod tests {
    use crate::browserless::{parse_function_output, ExtractMode, FunctionContext};
    use crate::{
        search_query, BrowserlessConfig, BrowserlessSource, FixtureAccount, FixtureListing,
        FixtureSource, PostSource,
    };
    use chrono::NaiveDate;
    use postrelay_core::{Candidate, CoreError, QueryDateRange, SourceError};
    use std::env;
    use std::time::Duration;

    fn range() -> QueryDateRange {
        QueryDateRange {
            since: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            until: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        }
    }

    fn create_test_source() -> BrowserlessSource {
        BrowserlessSource::new(BrowserlessConfig {
            base_url: "http://localhost:3000/".to_string(),
            token: Some("secret".to_string()),
            site_origin: "https://x.com/".to_string(),
            settle_millis: 10,
            request_timeout: Duration::from_secs(5),
        })
        .expect("client should build")
    }

    #[test]
    fn test_search_query_with_keyword() {
        assert_eq!(
            search_query("someone", Some("live"), range()),
            "from:someone live since:2024-05-01 until:2024-05-02"
        );
    }

    #[test]
    fn test_search_query_without_keyword() {
        assert_eq!(
            search_query("someone", None, range()),
            "from:someone since:2024-05-01 until:2024-05-02"
        );
    }

    #[test]
    fn test_search_url_is_encoded() {
        let source = create_test_source();
        let url = source.search_url("someone", Some("配信"), range()).unwrap();
        assert!(url.starts_with("https://x.com/search?q=from%3Asomeone+"));
        assert!(url.ends_with("&f=live"));
        assert!(!url.contains('配'));
    }

    #[test]
    fn test_page_url_for_profile() {
        let source = create_test_source();
        assert_eq!(
            source.page_url("someone").unwrap().as_str(),
            "https://x.com/someone"
        );
    }

    #[test]
    fn test_function_context_wire_format() {
        let context = FunctionContext {
            mode: ExtractMode::Articles,
            url: "https://x.com/someone".to_string(),
            limit: Some(15),
            settle_millis: 5000,
        };
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["mode"], "articles");
        assert_eq!(json["limit"], 15);
        assert_eq!(json["settleMillis"], 5000);
    }

    #[test]
    fn test_parse_function_output_tolerates_partial_records() {
        let body = r#"{
            "loggedIn": null,
            "candidates": [
                {"link": "https://x.com/a/status/10", "text": "one", "time": "2024-05-01T10:00:00.000Z"},
                {"link": null, "text": "ad without link", "time": null}
            ]
        }"#;
        let output = parse_function_output(body).unwrap();
        assert_eq!(output.logged_in, None);
        assert_eq!(output.candidates.len(), 2);
        assert_eq!(output.candidates[1].permalink, None);
    }

    #[test]
    fn test_parse_function_output_rejects_garbage() {
        let err = parse_function_output("<html>502</html>").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Source(SourceError::InvalidResponse { .. })
        ));
    }

    fn fixture() -> FixtureSource {
        let mut listing = FixtureListing::default();
        listing.accounts.insert(
            "someone".to_string(),
            FixtureAccount {
                query: vec![Candidate::new("https://x.com/someone/status/3", "q")],
                recent: (1..=20)
                    .rev()
                    .map(|i| Candidate::new(format!("https://x.com/someone/status/{}", i), "r"))
                    .collect(),
            },
        );
        listing.posts.insert(
            "https://x.com/someone/status/3".to_string(),
            Candidate::new("https://x.com/someone/status/3", "exact"),
        );
        FixtureSource::new(listing)
    }

    #[tokio::test]
    async fn test_fixture_source_serves_listings() {
        let source = fixture();
        assert!(source.session_ready().await.unwrap());

        let query = source.fetch_by_query("someone", None, range()).await.unwrap();
        assert_eq!(query.len(), 1);

        let recent = source.fetch_recent("someone", 15).await.unwrap();
        assert_eq!(recent.len(), 15);
        assert_eq!(
            recent[0].permalink.as_deref(),
            Some("https://x.com/someone/status/20")
        );

        let unknown = source.fetch_recent("nobody", 15).await.unwrap();
        assert!(unknown.is_empty());

        let post = source
            .fetch_post("https://x.com/someone/status/3")
            .await
            .unwrap();
        assert_eq!(post.map(|p| p.body_text), Some("exact".to_string()));
    }

    #[tokio::test]
    async fn test_fixture_source_from_file() {
        let path = env::temp_dir().join(format!("postrelay_fixture_{}.json", uuid::Uuid::new_v4()));
        let json = r#"{
            "session_ready": false,
            "accounts": {
                "someone": { "recent": [ {"link": "https://x.com/someone/status/9", "text": "hi"} ] }
            }
        }"#;
        tokio::fs::write(&path, json).await.unwrap();

        let source = FixtureSource::from_path(&path).await.unwrap();
        assert!(!source.session_ready().await.unwrap());
        assert!(source
            .fetch_by_query("someone", None, range())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(source.fetch_recent("someone", 15).await.unwrap().len(), 1);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_fixture_source_missing_file() {
        let err = FixtureSource::from_path(std::path::Path::new("/no/such/fixture.json"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Source(SourceError::FixtureUnavailable { .. })
        ));
    }
}
