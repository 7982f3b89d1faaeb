//! Query operation tests against scripted transports.
//!
//! These cover batching, continuation, merging, cancellation, retries and
//! failure reporting without touching the network.

mod common;

use std::time::Duration;

use common::MockTransport;
use common::body;
use serde_json::Value;
use serde_json::json;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use wapiti_lib::Completion;
use wapiti_lib::api::extract::Extractor;
use wapiti_lib::api::operations::get_protections;
use wapiti_lib::api::params::Param;
use wapiti_lib::api::params::ParamSet;
use wapiti_lib::api::params::RequestFrame;
use wapiti_lib::api::query::QueryOperation;
use wapiti_lib::api::query::QueryOptions;
use wapiti_lib::error::Error;
use wapiti_lib::error::TransportError;
use wapiti_lib::model::FieldValues;
use wapiti_lib::model::ProtectionInfo;
use wapiti_lib::model::Record;
use wapiti_lib::rate_limit::RateLimiter;
use wapiti_lib::rate_limit::RetryConfig;

/// `action=query&format=json&titles=...` with results under `query.pages`.
fn pages_params() -> ParamSet {
    ParamSet::builder()
        .param(Param::fixed("action", "query"))
        .param(Param::fixed("format", "json"))
        .param(Param::multi("titles").required().batched())
        .build()
        .unwrap()
}

fn pages_operation(options: QueryOptions) -> QueryOperation<Record> {
    QueryOperation::new("pages", pages_params(), Extractor::new(["query", "pages"]))
        .with_options(options)
}

fn fast_retry() -> RetryConfig {
    RetryConfig::default()
        .initial_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(2))
        .jitter(Duration::ZERO)
}

fn titles(items: &[&str]) -> FieldValues {
    FieldValues::new().set("titles", items.to_vec())
}

/// Titles in the frame, in wire order.
fn frame_titles(frame: &RequestFrame) -> Vec<String> {
    frame
        .get("titles")
        .map(|t| t.split('|').map(str::to_string).collect())
        .unwrap_or_default()
}

/// Answers every title `Tn` with page id `n`, no continuation.
fn echo_pages(frame: &RequestFrame) -> Value {
    let pages: serde_json::Map<String, Value> = frame_titles(frame)
        .into_iter()
        .map(|title| {
            let id: u64 = title.trim_start_matches('T').parse().unwrap();
            (id.to_string(), json!({"pageid": id, "title": title}))
        })
        .collect();
    json!({"query": {"pages": pages}})
}

fn identifiers<T>(records: &[wapiti_lib::api::query::ResultRecord<T>]) -> Vec<String> {
    records.iter().map(|r| r.identifier.to_string()).collect()
}

mod end_to_end {
    use super::*;

    #[tokio::test]
    async fn test_protection_lookup_returns_typed_records_in_order() {
        let params = ParamSet::builder()
            .param(Param::fixed("action", "query"))
            .param(Param::multi("titles").required().batched())
            .build()
            .unwrap();
        let extractor = Extractor::new(["pages"]).id_field("id");
        let operation = QueryOperation::<ProtectionInfo>::new("protection", params, extractor)
            .with_options(QueryOptions::default().max_batch_size(10));

        let transport = MockTransport::new(|_, _| {
            body(json!({
                "pages": {
                    "1": {"id": 1, "title": "A", "info": {"protection": []}},
                    "2": {
                        "id": 2,
                        "title": "B",
                        "info": {"protection": [{"type": "edit", "level": "sysop"}]}
                    }
                }
            }))
        });

        let records = operation
            .execute_records(&transport, &titles(&["A", "B"]))
            .await
            .unwrap();

        assert_eq!(identifiers(&records), vec!["1", "2"]);
        assert!(records[0].payload.is_unprotected());
        assert_eq!(records[1].payload.protections.len(), 1);
        assert_eq!(records[1].payload.level_for("edit"), Some("sysop"));
        assert_eq!(records[1].payload.title.as_deref(), Some("B"));
        assert_eq!(transport.calls(), 1);
        assert_eq!(transport.frames()[0].get("titles"), Some("A|B"));
    }

    #[tokio::test]
    async fn test_get_protections_against_query_pages() {
        let operation = get_protections().unwrap();
        let transport = MockTransport::new(|_, _| {
            body(json!({
                "batchcomplete": "",
                "query": {
                    "pages": {
                        "736": {
                            "pageid": 736,
                            "ns": 0,
                            "title": "Coffee",
                            "protection": [
                                {"type": "edit", "level": "autoconfirmed", "expiry": "infinity"},
                                {"type": "move", "level": "sysop", "expiry": "2030-01-01T00:00:00Z"}
                            ]
                        },
                        "-1": {"ns": 0, "title": "Missing page", "missing": "", "protection": []}
                    }
                }
            }))
        });

        let pages = operation
            .execute(&transport, &titles(&["Coffee", "Missing page"]))
            .await
            .unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_id, "736");
        assert_eq!(pages[0].level_for("move"), Some("sysop"));
        assert_eq!(pages[1].page_id, "-1");
        assert!(pages[1].is_unprotected());

        let frame = &transport.frames()[0];
        assert_eq!(frame.get("inprop"), Some("protection"));
        assert_eq!(frame.get("titles"), Some("Coffee|Missing page"));
    }

    #[tokio::test]
    async fn test_record_output_keeps_server_fields() {
        let transport = MockTransport::new(|_, frame| body(echo_pages(frame)));
        let records = pages_operation(QueryOptions::default())
            .execute(&transport, &titles(&["T7"]))
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier(), &"7");
        assert_eq!(records[0].get_string("title").unwrap(), Some("T7"));
    }
}

mod batching {
    use super::*;

    #[tokio::test]
    async fn test_splits_into_ceil_of_length_over_batch_size() {
        let transport = MockTransport::new(|_, frame| body(echo_pages(frame)));
        let operation = pages_operation(QueryOptions::default().max_batch_size(2));

        let response = operation
            .execute_best_effort(
                &transport,
                &titles(&["T1", "T2", "T3", "T4", "T5"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(response.is_complete());
        assert_eq!(response.stats.batches, 3);
        assert_eq!(response.stats.requests, 3);
        assert_eq!(transport.calls(), 3);

        let mut sent: Vec<Vec<String>> = transport.frames().iter().map(frame_titles).collect();
        sent.sort();
        assert_eq!(sent, vec![vec!["T1", "T2"], vec!["T3", "T4"], vec!["T5"]]);

        assert_eq!(identifiers(response.data()), vec!["1", "2", "3", "4", "5"]);
    }

    #[tokio::test]
    async fn test_static_params_reach_every_batch() {
        let transport = MockTransport::new(|_, frame| body(echo_pages(frame)));
        pages_operation(QueryOptions::default().max_batch_size(1))
            .execute(&transport, &titles(&["T1", "T2"]))
            .await
            .unwrap();

        for frame in transport.frames() {
            assert_eq!(frame.get("action"), Some("query"));
            assert_eq!(frame.get("format"), Some("json"));
            assert_eq!(frame_titles(&frame).len(), 1);
        }
    }

    #[tokio::test]
    async fn test_concurrent_batches_respect_limit() {
        let transport = MockTransport::new(|_, frame| body(echo_pages(frame)))
            .with_delay(|_| Duration::from_millis(20));
        let options = QueryOptions::default().max_batch_size(1).concurrency_limit(2);

        let records = pages_operation(options)
            .execute(&transport, &titles(&["T1", "T2", "T3", "T4", "T5", "T6"]))
            .await
            .unwrap();

        assert_eq!(records.len(), 6);
        assert_eq!(transport.calls(), 6);
        assert_eq!(transport.peak(), 2);
    }

    #[tokio::test]
    async fn test_single_permit_runs_batches_one_at_a_time() {
        let transport = MockTransport::new(|_, frame| body(echo_pages(frame)))
            .with_delay(|_| Duration::from_millis(5));
        let options = QueryOptions::default().max_batch_size(1).concurrency_limit(1);

        pages_operation(options)
            .execute(&transport, &titles(&["T1", "T2", "T3"]))
            .await
            .unwrap();

        assert_eq!(transport.calls(), 3);
        assert_eq!(transport.peak(), 1);
    }

    #[tokio::test]
    async fn test_rate_limiter_paces_requests() {
        let transport = MockTransport::new(|_, frame| body(echo_pages(frame)));
        let options = QueryOptions::default()
            .max_batch_size(1)
            .rate_limiter(RateLimiter::new(1, Duration::from_millis(50)));

        let start = Instant::now();
        pages_operation(options)
            .execute(&transport, &titles(&["T1", "T2", "T3"]))
            .await
            .unwrap();

        // One request per window: the third waits two windows.
        assert!(start.elapsed() >= Duration::from_millis(95));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_output_order_does_not_depend_on_arrival() {
        // The first batch answers last.
        let transport = MockTransport::new(|_, frame| body(echo_pages(frame))).with_delay(|frame| {
            if frame_titles(frame).contains(&"T1".to_string()) {
                Duration::from_millis(30)
            } else {
                Duration::ZERO
            }
        });

        let options = QueryOptions::default().max_batch_size(1).concurrency_limit(3);
        let records = pages_operation(options)
            .execute_records(&transport, &titles(&["T1", "T2", "T3"]))
            .await
            .unwrap();

        assert_eq!(identifiers(&records), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_overlapping_batches_merge_deterministically() {
        // Both batches report page 9; the later batch wins the conflict
        // even though it answers first.
        let transport = MockTransport::new(|_, frame| {
            let title = frame_titles(frame).remove(0);
            body(json!({
                "query": {"pages": {"9": {"pageid": 9, title.clone(): true, "owner": title}}}
            }))
        })
        .with_delay(|frame| {
            if frame.get("titles") == Some("A") {
                Duration::from_millis(30)
            } else {
                Duration::ZERO
            }
        });

        let options = QueryOptions::default().max_batch_size(1).concurrency_limit(2);
        let records = pages_operation(options)
            .execute(&transport, &titles(&["A", "B"]))
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get_string("owner").unwrap(), Some("B"));
        assert_eq!(records[0].get_bool("A").unwrap(), Some(true));
        assert_eq!(records[0].get_bool("B").unwrap(), Some(true));
    }
}

mod continuation {
    use super::*;

    #[tokio::test]
    async fn test_pages_are_merged_by_identifier() {
        let transport = MockTransport::new(|call, _| match call {
            0 => body(json!({
                "continue": {"plcontinue": "1|0|B", "continue": "||"},
                "query": {"pages": {"1": {"pageid": 1, "title": "A", "links": ["X"]}}}
            })),
            _ => body(json!({
                "query": {"pages": {
                    "1": {"pageid": 1, "touched": "2024-01-01T00:00:00Z", "links": ["Y"]},
                    "2": {"pageid": 2, "title": "B"}
                }}
            })),
        });

        let records = pages_operation(QueryOptions::default())
            .execute(&transport, &titles(&["A", "B"]))
            .await
            .unwrap();

        assert_eq!(transport.calls(), 2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identifier(), &"1");
        assert_eq!(records[0].get_string("title").unwrap(), Some("A"));
        assert_eq!(records[0].get_string("touched").unwrap(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(records[0].get("links"), Some(&json!(["X", "Y"])));
        assert_eq!(records[1].identifier(), &"2");
    }

    #[tokio::test]
    async fn test_token_is_echoed_on_top_of_base_frame() {
        let transport = MockTransport::new(|call, _| match call {
            0 => body(json!({
                "continue": {"plcontinue": "a", "continue": "||"},
                "query": {"pages": {}}
            })),
            1 => body(json!({
                "continue": {"clcontinue": "b", "continue": "||"},
                "query": {"pages": {}}
            })),
            _ => body(json!({"query": {"pages": {}}})),
        });

        pages_operation(QueryOptions::default())
            .execute(&transport, &titles(&["A"]))
            .await
            .unwrap();

        let frames = transport.frames();
        assert_eq!(frames.len(), 3);
        assert!(!frames[0].contains("plcontinue"));
        assert_eq!(frames[1].get("plcontinue"), Some("a"));
        assert_eq!(frames[1].get("titles"), Some("A"));
        // Tokens replace each other, they do not pile up.
        assert_eq!(frames[2].get("clcontinue"), Some("b"));
        assert!(!frames[2].contains("plcontinue"));
    }

    #[tokio::test]
    async fn test_legacy_query_continue_is_followed() {
        let transport = MockTransport::new(|call, _| match call {
            0 => body(json!({
                "query-continue": {"links": {"plcontinue": "1|0|B"}},
                "query": {"pages": {"1": {"pageid": 1}}}
            })),
            _ => body(json!({"query": {"pages": {"1": {"pageid": 1, "length": 10}}}})),
        });

        let records = pages_operation(QueryOptions::default())
            .execute(&transport, &titles(&["A"]))
            .await
            .unwrap();

        assert_eq!(transport.frames()[1].get("plcontinue"), Some("1|0|B"));
        assert_eq!(records[0].get_long("length").unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_page_limit_stops_endless_continuation() {
        let transport = MockTransport::new(|call, _| {
            body(json!({
                "continue": {"plcontinue": call.to_string()},
                "query": {"pages": {"1": {"pageid": 1}}}
            }))
        });

        let err = pages_operation(QueryOptions::default().max_pages(3))
            .execute(&transport, &titles(&["A"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ContinuationLimitExceeded { max_pages: 3, .. }));
        assert!(err.is_incomplete());
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn test_page_limit_keeps_partial_records_in_best_effort() {
        let transport = MockTransport::new(|call, _| {
            body(json!({
                "continue": {"plcontinue": call.to_string()},
                "query": {"pages": {(call + 1).to_string(): {"pageid": call + 1}}}
            }))
        });

        let response = pages_operation(QueryOptions::default().max_pages(2))
            .execute_best_effort(&transport, &titles(&["A"]), &CancellationToken::new())
            .await
            .unwrap();

        assert!(!response.is_complete());
        assert!(matches!(response.error(), Some(Error::ContinuationLimitExceeded { .. })));
        assert_eq!(identifiers(response.data()), vec!["1", "2", "3"]);
        assert_eq!(response.stats.requests, 3);
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn test_cancel_before_dispatch_sends_nothing() {
        let transport = MockTransport::new(|_, frame| body(echo_pages(frame)));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = pages_operation(QueryOptions::default())
            .execute_cancellable(&transport, &titles(&["T1", "T2"]), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_loop_keeps_only_merged_pages() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let transport = MockTransport::new(move |call, _| {
            if call == 1 {
                // Cancelled while the second page is in flight.
                trigger.cancel();
            }
            body(json!({
                "continue": {"plcontinue": call.to_string()},
                "query": {"pages": {(call + 1).to_string(): {"pageid": call + 1}}}
            }))
        });

        let response = pages_operation(QueryOptions::default())
            .execute_best_effort(&transport, &titles(&["A"]), &cancel)
            .await
            .unwrap();

        assert!(matches!(response.completion, Completion::Incomplete(Error::Cancelled { .. })));
        assert_eq!(identifiers(response.data()), vec!["1"]);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_cancel_while_rate_limited_sends_nothing_more() {
        let transport = MockTransport::new(|call, _| {
            body(json!({
                "continue": {"plcontinue": call.to_string()},
                "query": {"pages": {"1": {"pageid": 1}}}
            }))
        });
        let options =
            QueryOptions::default().rate_limiter(RateLimiter::new(1, Duration::from_millis(400)));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let err = pages_operation(options)
            .execute_cancellable(&transport, &titles(&["A"]), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(transport.calls(), 1);
        // Woken by the cancellation, not by the limiter window.
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_retry_backoff() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let transport = MockTransport::new(move |_, _| {
            trigger.cancel();
            Err(TransportError::http(503, "unavailable"))
        });
        let options = QueryOptions::default()
            .retry(RetryConfig::default().initial_delay(Duration::from_secs(60)));

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            pages_operation(options).execute_cancellable(&transport, &titles(&["A"]), &cancel),
        )
        .await
        .expect("backoff was not interrupted")
        .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(transport.calls(), 1);
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let transport = MockTransport::new(|call, frame| match call {
            0 => Err(TransportError::http(503, "unavailable")),
            1 => Err(TransportError::Timeout(Duration::from_secs(1))),
            _ => body(echo_pages(frame)),
        });

        let response = pages_operation(QueryOptions::default().retry(fast_retry()))
            .execute_best_effort(&transport, &titles(&["T1"]), &CancellationToken::new())
            .await
            .unwrap();

        assert!(response.is_complete());
        assert_eq!(response.stats.requests, 3);
        assert_eq!(response.stats.retries, 2);
        assert_eq!(response.stats.pages, 1);
        assert_eq!(identifiers(response.data()), vec!["1"]);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let transport = MockTransport::new(|_, _| Err(TransportError::http(502, "bad gateway")));

        let err = pages_operation(QueryOptions::default().retry(fast_retry().max_retries(2)))
            .execute(&transport, &titles(&["A"]))
            .await
            .unwrap_err();

        match err {
            Error::Transport { attempts, source, .. } => {
                assert_eq!(attempts, 3);
                assert_eq!(source.status_code(), Some(502));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let transport = MockTransport::new(|_, _| Err(TransportError::http(404, "not found")));

        let err = pages_operation(QueryOptions::default().retry(fast_retry()))
            .execute(&transport, &titles(&["A"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport { attempts: 1, .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_response_is_not_retried() {
        let transport = MockTransport::new(|_, _| body(json!({"batchcomplete": ""})));

        let err = pages_operation(QueryOptions::default().retry(fast_retry()))
            .execute(&transport, &titles(&["A"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedResponse { .. }));
        assert!(err.to_string().contains("query.pages"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let transport = MockTransport::new(|_, _| Ok("<html>maintenance</html>".to_string()));

        let err = pages_operation(QueryOptions::default())
            .execute(&transport, &titles(&["A"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_api_error_section() {
        let transport = MockTransport::new(|_, _| {
            body(json!({
                "error": {
                    "code": "toomanyvalues",
                    "info": "Too many values supplied for parameter \"titles\"."
                }
            }))
        });

        let err = pages_operation(QueryOptions::default())
            .execute(&transport, &titles(&["A"]))
            .await
            .unwrap_err();

        match err {
            Error::Api { detail, context } => {
                assert!(detail.has_code("toomanyvalues"));
                assert_eq!(context.page, Some(1));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_failing_batch_reports_its_error() {
        let transport = MockTransport::new(|_, frame| {
            if frame.get("titles") == Some("T2") {
                Err(TransportError::http(400, "bad request"))
            } else {
                body(echo_pages(frame))
            }
        });

        let options = QueryOptions::default().max_batch_size(1).concurrency_limit(1);
        let fields = titles(&["T1", "T2", "T3"]);
        let response = pages_operation(options)
            .execute_best_effort(&transport, &fields, &CancellationToken::new())
            .await
            .unwrap();

        let error = response.error().unwrap();
        assert_eq!(error.context().and_then(|c| c.batch), Some(1));
        // With one batch at a time, the third never starts.
        assert_eq!(identifiers(response.data()), vec!["1"]);
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let transport = MockTransport::new(|_, frame| body(echo_pages(frame)))
            .with_delay(|_| Duration::from_millis(200));

        let err = pages_operation(
            QueryOptions::default()
                .retry(RetryConfig::no_retry())
                .request_timeout(Duration::from_millis(5)),
        )
        .execute(&transport, &titles(&["T1"]))
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            Error::Transport {
                source: TransportError::Timeout(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_operation_timeout() {
        let transport = MockTransport::new(|_, frame| body(echo_pages(frame)))
            .with_delay(|_| Duration::from_millis(500));

        let err = pages_operation(QueryOptions::default().timeout(Duration::from_millis(10)))
            .execute(&transport, &titles(&["T1"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_conversion_failure() {
        // Page 2 has no protection list.
        let transport = MockTransport::new(|_, _| {
            body(json!({
                "query": {"pages": {
                    "1": {"pageid": 1, "protection": []},
                    "2": {"pageid": 2}
                }}
            }))
        });
        let operation = get_protections().unwrap();

        let err = operation
            .execute(&transport, &titles(&["A", "B"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conversion { ref identifier, .. } if identifier == &"2"));

        let response = operation
            .execute_best_effort(&transport, &titles(&["A", "B"]), &CancellationToken::new())
            .await
            .unwrap();
        assert!(!response.is_complete());
        assert_eq!(identifiers(response.data()), vec!["1"]);
    }
}

mod parameters {
    use super::*;

    #[tokio::test]
    async fn test_missing_required_field_sends_nothing() {
        let transport = MockTransport::new(|_, frame| body(echo_pages(frame)));

        let err = pages_operation(QueryOptions::default())
            .execute(&transport, &FieldValues::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingParameter { ref name, .. } if name == "titles"));
        assert!(err.is_parameter_error());
        assert_eq!(err.operation(), "pages");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_unexpected_field_sends_nothing() {
        let transport = MockTransport::new(|_, frame| body(echo_pages(frame)));
        let fields = titles(&["T1"]).set("redirects", "1");

        let err = pages_operation(QueryOptions::default())
            .execute(&transport, &fields)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnexpectedParameter { ref name, .. } if name == "redirects"));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_best_effort_still_rejects_bad_fields() {
        let transport = MockTransport::new(|_, frame| body(echo_pages(frame)));

        let result = pages_operation(QueryOptions::default())
            .execute_best_effort(&transport, &FieldValues::new(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(Error::MissingParameter { .. })));
        assert_eq!(transport.calls(), 0);
    }
}
