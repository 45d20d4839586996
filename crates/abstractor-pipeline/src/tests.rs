//! Integration tests for the extraction pipeline

#[cfg(test)]
mod tests {
    use crate::{
        CallStrategy, ExtractionPipeline, ExtractionRequest, PipelineConfig, PipelineError,
    };
    use abstractor_llm::MockBackend;
    use serde_json::Value;

    fn request(text: impl Into<String>) -> ExtractionRequest {
        ExtractionRequest {
            text: text.into(),
            schema_id: "purchase_agreement".to_string(),
        }
    }

    fn short_contract() -> String {
        "This purchase agreement is entered into between Jane Doe as buyer and \
         John Smith as seller. The purchase price shall be $450,000 with earnest \
         money of $5,000 held in escrow."
            .to_string()
    }

    /// A document long enough to force chunking at small chunk sizes, with
    /// distinct markers in the first and second halves.
    fn two_part_contract() -> String {
        let first = "The purchase price is four hundred fifty thousand dollars ALPHA. ".repeat(5);
        let second = "The earnest money deposit is five thousand dollars OMEGA. ".repeat(5);
        format!("{}{}", first, second)
    }

    #[tokio::test]
    async fn test_single_call_success() {
        let mut primary = MockBackend::new("{}").with_name("primary");
        primary.add_rule(
            "purchase price",
            r#"{"purchase_price": "450000", "earnest_money": "5000"}"#,
        );
        let pipeline = ExtractionPipeline::new(
            primary,
            MockBackend::new("{}").with_name("secondary"),
            PipelineConfig::default(),
        );

        let result = pipeline.extract(request(short_contract())).await.unwrap();

        assert_eq!(result.data["purchase_price"], "450000");
        assert_eq!(result.backend_used, "primary");
        assert_eq!(result.metadata.strategy, CallStrategy::Single);
        assert_eq!(result.metadata.chunk_failures, 0);
        // 2 of 10 required fields completed.
        assert_eq!(result.confidence, 20);
    }

    #[tokio::test]
    async fn test_fenced_output_is_parsed() {
        let primary = MockBackend::new("```json\n{\"a\": 1}\n```").with_name("primary");
        let pipeline = ExtractionPipeline::new(
            primary,
            MockBackend::new("{}"),
            PipelineConfig::default(),
        );

        let result = pipeline.extract(request(short_contract())).await.unwrap();

        assert_eq!(result.data["a"], 1);
        assert_eq!(result.backend_used, "primary");
        assert_eq!(result.confidence, 0);
    }

    #[tokio::test]
    async fn test_chunked_extraction_merges_across_chunks() {
        let mut primary = MockBackend::new("{}")
            .with_name("primary")
            .with_single_call_limit(10)
            .with_chunk_size(400);
        primary.add_rule(
            "ALPHA",
            r#"{"purchase_price": "450000", "earnest_money": null}"#,
        );
        primary.add_rule(
            "OMEGA",
            r#"{"purchase_price": null, "earnest_money": "5000"}"#,
        );
        let pipeline = ExtractionPipeline::new(
            primary,
            MockBackend::new("{}"),
            PipelineConfig::default(),
        );

        let result = pipeline.extract(request(two_part_contract())).await.unwrap();

        // Null values from later chunks never overwrite earlier real values.
        assert_eq!(result.data["purchase_price"], "450000");
        assert_eq!(result.data["earnest_money"], "5000");
        assert!(matches!(
            result.metadata.strategy,
            CallStrategy::Chunked { chunks } if chunks > 1
        ));
        assert_eq!(result.confidence, 20);
    }

    #[tokio::test]
    async fn test_quota_error_never_falls_back() {
        let primary = MockBackend::fail_all_with_quota("quota exceeded").with_name("primary");
        let secondary = MockBackend::new("{}").with_name("secondary");
        let secondary_counter = secondary.clone();
        let pipeline = ExtractionPipeline::new(primary, secondary, PipelineConfig::default());

        let result = pipeline.extract(request(short_contract())).await;

        assert!(matches!(result, Err(PipelineError::QuotaExhausted(_))));
        assert_eq!(secondary_counter.call_count(), 0);
    }

    #[tokio::test]
    async fn test_quota_error_mid_chunked_run_never_falls_back() {
        let primary = MockBackend::fail_all_with_quota("quota exceeded")
            .with_name("primary")
            .with_single_call_limit(10)
            .with_chunk_size(400);
        let secondary = MockBackend::new("{}").with_name("secondary");
        let secondary_counter = secondary.clone();
        let pipeline = ExtractionPipeline::new(primary, secondary, PipelineConfig::default());

        let result = pipeline.extract(request(two_part_contract())).await;

        assert!(matches!(result, Err(PipelineError::QuotaExhausted(_))));
        assert_eq!(secondary_counter.call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_quota_failure_falls_back_to_secondary() {
        let primary = MockBackend::fail_all("connection refused").with_name("primary");
        let primary_counter = primary.clone();
        let mut secondary = MockBackend::new("{}").with_name("secondary");
        secondary.add_rule("purchase price", r#"{"purchase_price": "450000"}"#);
        let pipeline = ExtractionPipeline::new(primary, secondary, PipelineConfig::default());

        let result = pipeline.extract(request(short_contract())).await.unwrap();

        assert_eq!(result.backend_used, "secondary");
        assert_eq!(result.data["purchase_price"], "450000");
        assert!(primary_counter.call_count() >= 1);
    }

    #[tokio::test]
    async fn test_both_backends_failing_is_fatal_with_both_messages() {
        let primary = MockBackend::fail_all("primary down").with_name("primary");
        let secondary = MockBackend::fail_all("secondary down").with_name("secondary");
        let pipeline = ExtractionPipeline::new(primary, secondary, PipelineConfig::default());

        let result = pipeline.extract(request(short_contract())).await;

        match result {
            Err(PipelineError::AllBackendsFailed { primary, secondary }) => {
                assert!(primary.contains("primary down"));
                assert!(secondary.contains("secondary down"));
            }
            other => panic!("Expected AllBackendsFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_unparseable_output_degrades_to_default_record() {
        let primary = MockBackend::new("I could not find any fields.").with_name("primary");
        let pipeline = ExtractionPipeline::new(
            primary,
            MockBackend::new("{}"),
            PipelineConfig::default(),
        );

        let result = pipeline.extract(request(short_contract())).await.unwrap();

        assert_eq!(result.backend_used, "primary+parse-fallback");
        assert_eq!(result.data["purchase_price"], Value::Null);
        assert_eq!(result.data["financing_type"], "unknown");
        assert_eq!(result.data["contingencies"]["financing"], false);
        // Enum and boolean defaults still count as completed: 4 of 10.
        assert_eq!(result.confidence, 40);
    }

    #[tokio::test]
    async fn test_failed_chunks_become_empty_records() {
        let mut primary = MockBackend::new("{}")
            .with_name("primary")
            .with_single_call_limit(10)
            .with_chunk_size(400);
        primary.add_rule("ALPHA", r#"{"purchase_price": "450000"}"#);
        primary.add_error_rule("OMEGA", "transient failure");
        let pipeline = ExtractionPipeline::new(
            primary,
            MockBackend::new("{}"),
            PipelineConfig::default(),
        );

        let result = pipeline.extract(request(two_part_contract())).await.unwrap();

        // The surviving chunks still contribute to the merged record.
        assert_eq!(result.data["purchase_price"], "450000");
        assert_eq!(result.backend_used, "primary");
        assert!(result.metadata.chunk_failures >= 1);
    }

    #[tokio::test]
    async fn test_all_chunks_failing_falls_back_to_secondary() {
        let primary = MockBackend::fail_all("connection refused")
            .with_name("primary")
            .with_single_call_limit(10)
            .with_chunk_size(400);
        let mut secondary = MockBackend::new("{}").with_name("secondary");
        secondary.add_rule("earnest money", r#"{"earnest_money": "5000"}"#);
        let pipeline = ExtractionPipeline::new(primary, secondary, PipelineConfig::default());

        let result = pipeline.extract(request(two_part_contract())).await.unwrap();

        assert_eq!(result.backend_used, "secondary");
        assert_eq!(result.data["earnest_money"], "5000");
    }

    #[tokio::test]
    async fn test_confidence_bounds() {
        let mut primary = MockBackend::new("{}").with_name("primary");
        primary.add_rule(
            "purchase price",
            r#"{
                "parties": {"buyer": "Jane Doe", "seller": "John Smith"},
                "property": {"address": "123 Main St"},
                "purchase_price": "450000",
                "earnest_money": "5000",
                "closing_date": "2026-09-01",
                "financing_type": "conventional",
                "contingencies": {"financing": true, "inspection": true, "appraisal": false}
            }"#,
        );
        let pipeline = ExtractionPipeline::new(
            primary,
            MockBackend::new("{}"),
            PipelineConfig::default(),
        );

        let result = pipeline.extract(request(short_contract())).await.unwrap();
        assert_eq!(result.confidence, 100);

        let empty = pipeline
            .extract(ExtractionRequest {
                text: format!("{} nothing matched here", "filler text ".repeat(10)),
                schema_id: "purchase_agreement".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(empty.confidence, 0);
    }

    #[tokio::test]
    async fn test_metadata_is_populated() {
        let primary = MockBackend::new("{}").with_name("primary");
        let pipeline = ExtractionPipeline::new(
            primary,
            MockBackend::new("{}"),
            PipelineConfig::default(),
        );

        let result = pipeline.extract(request(short_contract())).await.unwrap();

        assert!(!result.metadata.request_id.is_empty());
        assert_eq!(result.metadata.schema_id, "purchase_agreement");
        assert_eq!(result.metadata.strategy, CallStrategy::Single);
    }
}
