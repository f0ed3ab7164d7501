#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use super::{RecordedCall, recording_connection, recording_connection_with_limit, select_page};
use crate::{
    ConstrainingQuery, Page, Ruleset, SparqlQuery, Term, Transaction,
    error::StoreClientError,
};

fn ask_requests(calls: &[RecordedCall]) -> Vec<crate::QueryRequest> {
    calls
        .iter()
        .filter_map(|call| match call {
            RecordedCall::Ask { request, .. } => Some(request.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn base_prologue_reaches_the_wire() {
    let (conn, state) = recording_connection();

    let query = SparqlQuery::new("ASK WHERE { ?s ?p ?o . }")
        .with_base_iri("http://example.org/base");
    conn.ask(&query, None).await.unwrap();

    let requests = ask_requests(&state.recorded());
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].text(),
        "BASE <http://example.org/base>\nASK WHERE { ?s ?p ?o . }"
    );
}

#[tokio::test]
async fn absent_base_iri_leaves_text_untouched() {
    let (conn, state) = recording_connection();

    conn.ask(&SparqlQuery::new("ASK WHERE { ?s ?p ?o . }"), None)
        .await
        .unwrap();

    let requests = ask_requests(&state.recorded());
    assert_eq!(requests[0].text(), "ASK WHERE { ?s ?p ?o . }");
}

#[tokio::test]
async fn bindings_reach_the_wire_in_lexical_form() {
    let (conn, state) = recording_connection();

    let query = SparqlQuery::new("ASK WHERE { ?s ?p ?o . }")
        .with_binding("s", Term::iri("http://example.org/r9928"))
        .with_binding("o", Term::typed_literal("1", "http://www.w3.org/2001/XMLSchema#int"))
        .with_binding("o", Term::lang_literal("chat", "fr"));
    conn.ask(&query, None).await.unwrap();

    let requests = ask_requests(&state.recorded());
    let bindings = requests[0].bindings();
    assert_eq!(bindings.len(), 3);
    assert_eq!(bindings[0].name, "s");
    assert_eq!(bindings[0].value, "http://example.org/r9928");
    assert_eq!(bindings[1].name, "o");
    assert_eq!(bindings[1].value, "1");
    assert_eq!(bindings[2].name, "o");
    assert_eq!(bindings[2].value, "chat");
}

#[tokio::test]
async fn malformed_requests_never_reach_the_backend() {
    let (conn, state) = recording_connection();

    let empty = conn.ask(&SparqlQuery::new(""), None).await;
    assert!(matches!(empty, Err(StoreClientError::MalformedRequest { .. })));

    let bad_binding = conn
        .ask(
            &SparqlQuery::new("ASK WHERE { ?s ?p ?o . }").with_binding("bad name", Term::literal("x")),
            None,
        )
        .await;
    assert!(matches!(
        bad_binding,
        Err(StoreClientError::MalformedRequest { .. })
    ));

    let nul = conn
        .ask(&SparqlQuery::new("ASK { ?s ?p \"a\0b\" . }"), None)
        .await;
    assert!(matches!(nul, Err(StoreClientError::MalformedRequest { .. })));

    assert!(state.recorded().is_empty());
}

#[tokio::test]
async fn defaults_attach_to_requests_while_present() {
    let (conn, state) = recording_connection();

    conn.set_ruleset(Some(Ruleset::new(["rdfs"]))).await;
    conn.set_constraining_query(Some(ConstrainingQuery::Text("First Title".to_string())))
        .await;
    conn.ask(&SparqlQuery::new("ASK WHERE { ?s ?p ?o . }"), None)
        .await
        .unwrap();

    conn.set_ruleset(None).await;
    conn.set_constraining_query(None).await;
    conn.ask(&SparqlQuery::new("ASK WHERE { ?s ?p ?o . }"), None)
        .await
        .unwrap();

    let requests = ask_requests(&state.recorded());
    assert_eq!(requests[0].ruleset().unwrap().names(), ["rdfs"]);
    assert_eq!(
        requests[0].constraining_query(),
        Some(&ConstrainingQuery::Text("First Title".to_string()))
    );
    assert!(requests[1].ruleset().is_none());
    assert!(requests[1].constraining_query().is_none());
}

#[tokio::test]
async fn attachment_order_does_not_change_the_request() {
    let query = SparqlQuery::new("ASK WHERE {<http://example.org/r9928> ?p ?o .}")
        .with_binding("p", Term::iri("http://example.org/p3"));
    let ruleset = Ruleset::new(["owl-horst"]);
    let filter = ConstrainingQuery::Text("First Title".to_string());

    let (first, first_state) = recording_connection();
    first.set_ruleset(Some(ruleset.clone())).await;
    first.set_constraining_query(Some(filter.clone())).await;
    let first_result = first.ask(&query, None).await.unwrap();

    let (second, second_state) = recording_connection();
    second.set_constraining_query(Some(filter)).await;
    second.set_ruleset(Some(ruleset)).await;
    let second_result = second.ask(&query, None).await.unwrap();

    assert_eq!(first_result, second_result);
    assert_eq!(
        ask_requests(&first_state.recorded()),
        ask_requests(&second_state.recorded())
    );
}

#[tokio::test]
async fn inference_can_be_suppressed_with_a_ruleset_configured() {
    let (conn, state) = recording_connection();

    conn.set_ruleset(Some(Ruleset::new(["owl"]))).await;
    conn.ask(
        &SparqlQuery::new("ASK WHERE { ?s ?p ?o . }").include_inferred(false),
        None,
    )
    .await
    .unwrap();

    let requests = ask_requests(&state.recorded());
    assert!(!requests[0].include_inferred());
    assert!(requests[0].ruleset().is_some());
}

#[tokio::test]
async fn ask_returns_the_backend_verdict() {
    let (conn, state) = recording_connection();
    *state.ask_result.lock().unwrap() = true;

    let verdict = conn
        .ask(&SparqlQuery::new("ASK WHERE { ?s ?p ?o . }"), None)
        .await
        .unwrap();
    assert!(verdict);
}

#[tokio::test]
async fn transaction_handle_is_forwarded_unmodified() {
    let (conn, state) = recording_connection();
    let tx = Transaction::from_id("tx-42");

    conn.ask(&SparqlQuery::new("ASK WHERE { ?s ?p ?o . }"), Some(&tx))
        .await
        .unwrap();

    match &state.recorded()[0] {
        RecordedCall::Ask { txid, .. } => assert_eq!(txid.as_deref(), Some("tx-42")),
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn full_first_page_triggers_a_second_fetch() {
    let (conn, state) = recording_connection();
    {
        let mut pages = state.select_pages.lock().unwrap();
        pages.push_back(select_page("s", &["http://example.org/a", "http://example.org/b"]));
        pages.push_back(select_page("s", &["http://example.org/c"]));
    }

    let results = conn
        .select(&SparqlQuery::new("SELECT * { ?s ?p ?o . }"), Page::new(1, 2), None)
        .await
        .unwrap();
    assert_eq!(results.variables(), ["s"]);
    let rows = results.collect_rows().await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].get_str("s"), Some("http://example.org/c"));

    let pages: Vec<Page> = state
        .recorded()
        .iter()
        .filter_map(|call| match call {
            RecordedCall::Select { page, .. } => Some(*page),
            _ => None,
        })
        .collect();
    assert_eq!(pages, [Page::new(1, 2), Page::new(3, 2)]);
}

#[tokio::test]
async fn short_first_page_ends_the_stream_without_further_fetches() {
    let (conn, state) = recording_connection();
    state
        .select_pages
        .lock()
        .unwrap()
        .push_back(select_page("s", &["http://example.org/a"]));

    let results = conn
        .select(&SparqlQuery::new("SELECT * { ?s ?p ?o . }"), Page::new(1, 2), None)
        .await
        .unwrap();
    let rows = results.collect_rows().await.unwrap();
    assert_eq!(rows.len(), 1);

    let select_calls = state
        .recorded()
        .iter()
        .filter(|call| matches!(call, RecordedCall::Select { .. }))
        .count();
    assert_eq!(select_calls, 1);
}

#[tokio::test]
async fn zero_page_length_is_clamped() {
    let (conn, state) = recording_connection();

    let results = conn
        .select(&SparqlQuery::new("SELECT * { ?s ?p ?o . }"), Page::new(1, 0), None)
        .await
        .unwrap();
    let rows = results.collect_rows().await.unwrap();
    assert!(rows.is_empty());

    match &state.recorded()[0] {
        RecordedCall::Select { page, .. } => assert_eq!(page.length, 1),
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn graph_query_yields_trimmed_lines() {
    let (conn, state) = recording_connection();
    *state.graph_body.lock().unwrap() =
        "<a> <b> <c> .\n\n  <d> <e> <f> .\n".to_string();

    let results = conn
        .graph(&SparqlQuery::new("CONSTRUCT { ?s ?p ?o } WHERE { ?s ?p ?o }"), None)
        .await
        .unwrap();
    assert_eq!(results.into_lines(), ["<a> <b> <c> .", "<d> <e> <f> ."]);
}

#[tokio::test]
async fn has_statement_builds_graph_scoped_ask() {
    let (conn, state) = recording_connection();

    conn.has_statement(
        Some(&Term::iri("http://example.org/s")),
        None,
        Some(&Term::typed_literal("1", "http://www.w3.org/2001/XMLSchema#int")),
        &["http://example.org/g1".to_string()],
        None,
    )
    .await
    .unwrap();

    let requests = ask_requests(&state.recorded());
    assert_eq!(
        requests[0].text(),
        "ASK WHERE { GRAPH <http://example.org/g1> { ?s ?p ?o . } }"
    );
    let bindings = requests[0].bindings();
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].name, "s");
    assert_eq!(bindings[0].value, "http://example.org/s");
    assert_eq!(bindings[1].name, "o");
    assert_eq!(
        bindings[1].value,
        "\"1\"^^<http://www.w3.org/2001/XMLSchema#int>"
    );
}

#[tokio::test]
async fn has_statement_without_contexts_uses_the_unscoped_pattern() {
    let (conn, state) = recording_connection();

    conn.has_statement(None, None, None, &[], None).await.unwrap();

    let requests = ask_requests(&state.recorded());
    assert_eq!(requests[0].text(), "ASK WHERE { ?s ?p ?o . }");
    assert!(requests[0].bindings().is_empty());
}

#[tokio::test]
async fn default_transaction_lifecycle_is_not_supported() {
    let (conn, _state) = recording_connection();

    assert!(matches!(
        conn.begin_transaction().await,
        Err(StoreClientError::NotSupported { operation: "begin_transaction" })
    ));
    let tx = Transaction::from_id("tx-1");
    assert!(matches!(
        conn.commit_transaction(&tx).await,
        Err(StoreClientError::NotSupported { .. })
    ));
    assert!(matches!(
        conn.rollback_transaction(&tx).await,
        Err(StoreClientError::NotSupported { .. })
    ));
}

#[tokio::test]
async fn limiter_of_one_serializes_parallel_updates() {
    let (conn, state) = recording_connection_with_limit(1);
    *state.update_delay.lock().unwrap() = Some(std::time::Duration::from_millis(20));
    let conn = Arc::new(conn);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let conn = conn.clone();
        handles.push(tokio::spawn(async move {
            conn.update(&SparqlQuery::new("INSERT DATA { <a> <b> <c> . }"), None)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(
        state.max_in_flight.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}
