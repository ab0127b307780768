//! Tests for batch enrichment prompts and reply parsing.

use tally_core::{
    EnrichTransaction, Error,
    enrich::{
        categorization_prompt, check_batch, merchant_detection_prompt, parse_categorizations,
        parse_merchants, strip_fence,
    },
};

fn transactions() -> Vec<EnrichTransaction> {
    vec![
        EnrichTransaction {
            id: "tx_1".into(),
            name: "STARBUCKS #1234".into(),
            amount: -5.5,
            merchant: None,
        },
        EnrichTransaction {
            id: "tx_2".into(),
            name: "NETFLIX.COM".into(),
            amount: -15.99,
            merchant: Some("Netflix".into()),
        },
    ]
}

#[test]
fn categorization_prompt_lists_categories_and_transactions() {
    let prompt = categorization_prompt(&transactions(), &["Food".into(), "Streaming".into()]);
    assert!(prompt.contains("- Food\n- Streaming\n"));
    assert!(prompt.contains("ID: tx_1, Name: STARBUCKS #1234, Amount: -5.50, Merchant: unknown"));
    assert!(prompt.contains("Merchant: Netflix"));
    assert!(prompt.contains("\"category_name\""));
}

#[test]
fn merchant_prompt_lists_known_merchants() {
    let prompt = merchant_detection_prompt(&transactions(), &["Starbucks".into()]);
    assert!(prompt.contains("ID: tx_2, Name: NETFLIX.COM"));
    assert!(prompt.contains("- Starbucks"));
    assert!(prompt.contains("\"business_url\""));
}

#[test]
fn batch_cap_is_inclusive() {
    let tx = transactions()[0].clone();
    assert!(check_batch("auto-categorize", &vec![tx.clone(); 25]).is_ok());
    let err = check_batch("auto-categorize", &vec![tx; 26]).unwrap_err();
    assert!(matches!(
        err,
        Error::TooManyItems {
            count: 26,
            max: 25,
            ..
        }
    ));
}

#[test]
fn parses_fenced_categorizations() {
    let text = "```json\n[{\"transaction_id\": \"tx_1\", \"category_name\": \"Food\"}, \
                {\"transaction_id\": \"tx_2\", \"category_name\": null}]\n```";
    let parsed = parse_categorizations("Gemini", text, &transactions()).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].category_name.as_deref(), Some("Food"));
    assert_eq!(parsed[1].category_name, None);
}

#[test]
fn unknown_ids_are_dropped() {
    let text = r#"[{"transaction_id": "tx_9", "category_name": "Food"}]"#;
    let parsed = parse_categorizations("Gemini", text, &transactions()).unwrap();
    assert!(parsed.is_empty());
}

#[test]
fn numeric_ids_are_accepted() {
    let txs = vec![EnrichTransaction {
        id: "42".into(),
        name: "SHELL".into(),
        amount: -40.0,
        merchant: None,
    }];
    let text = r#"[{"transaction_id": 42, "business_name": "Shell", "business_url": "shell.com"}]"#;
    let parsed = parse_merchants("Gemini", text, &txs).unwrap();
    assert_eq!(parsed[0].transaction_id, "42");
    assert_eq!(parsed[0].business_url.as_deref(), Some("shell.com"));
}

#[test]
fn missing_field_is_malformed() {
    let text = r#"[{"transaction_id": "tx_1", "business_name": "Starbucks"}]"#;
    let err = parse_merchants("Gemini", text, &transactions()).unwrap_err();
    match err {
        Error::MalformedProviderOutput { provider, message } => {
            assert_eq!(provider, "Gemini");
            assert!(message.contains("business_url"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn prose_is_malformed() {
    let err = parse_categorizations("OpenAI", "Sure! Here you go.", &transactions()).unwrap_err();
    assert!(matches!(err, Error::MalformedProviderOutput { .. }));
}

#[test]
fn strip_fence_leaves_plain_json() {
    assert_eq!(strip_fence("  [1, 2]  "), "[1, 2]");
    assert_eq!(strip_fence("```\n[]\n```"), "[]");
}
