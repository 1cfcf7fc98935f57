mod common;

use common::{ScriptedClient, read_back, session, system_prompt, user_prompt, write_workbook};
use review_themes::error::Error;
use review_themes::{flagging, reformulate};

#[test]
fn test_flag_run_reports_strong_complaints() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("reviews.xlsx");
    let output = dir.path().join("flagged.xlsx");
    write_workbook(
        &input,
        "Sheet1",
        &["text"],
        &[
            vec!["Lovely staff and quick delivery"],
            vec!["My honest review was flagged and removed, support never replied"],
        ],
    );

    let client = ScriptedClient::new(|request| {
        let system = system_prompt(request);
        // The first line carries the review; the rest is the fixed question.
        let review = user_prompt(request).lines().next().unwrap_or_default();
        let flagged = review.contains("flagged");
        if system.contains("Only return YES or NO") {
            Ok(if flagged { "YES" } else { "NO" }.to_string())
        } else if system.contains("Score how strongly") {
            Ok("8".to_string())
        } else {
            Ok("Reason unclear. No response. Feels silenced.".to_string())
        }
    });

    let found = flagging::run(&session(&client), &input, None, "text", &output, 3)
        .unwrap()
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].index, 1);

    let rows = read_back(&output);
    assert_eq!(rows[0], ["Review_Index", "Review_Text", "Relevance_Score", "Details"]);
    assert_eq!(rows[1][0], "1");
    assert_eq!(rows[1][2], "8");
    assert_eq!(rows[1][3], "Reason unclear. No response. Feels silenced.");
}

#[test]
fn test_reformulate_run_appends_columns() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("dataset.xlsx");
    let guidelines = dir.path().join("guidelines.txt");
    let output = dir.path().join("out.xlsx");
    std::fs::write(&guidelines, "Do not share personal information.").unwrap();
    write_workbook(
        &input,
        "dataset",
        &reformulate::REQUIRED_COLUMNS,
        &[vec![
            "42",
            "Acme",
            "Sam",
            "The manager Jane Doe (555-1234) was rude",
            "Personal information",
            "2",
            "We are sorry",
        ]],
    );

    let client = ScriptedClient::new(|request| {
        assert!(user_prompt(request).contains("Do not share personal information."));
        Ok("Explanation: It named an employee.\nRewrite: The manager was rude.".to_string())
    });

    let report =
        reformulate::run(&session(&client), &input, "dataset", &guidelines, &output).unwrap();
    assert_eq!(report.rows.len(), 1);

    let rows = read_back(&output);
    assert_eq!(rows[0].len(), 9);
    assert_eq!(rows[0][7], "Explanation");
    assert_eq!(rows[0][8], "Rewrite");
    assert_eq!(rows[1][0], "42");
    assert_eq!(rows[1][7], "It named an employee.");
    assert_eq!(rows[1][8], "The manager was rude.");
}

#[test]
fn test_reformulate_requires_guidelines() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("dataset.xlsx");
    write_workbook(
        &input,
        "dataset",
        &reformulate::REQUIRED_COLUMNS,
        &[vec!["1", "Acme", "Sam", "Bad", "Spam", "1", ""]],
    );

    let client = ScriptedClient::new(|_| Ok(String::new()));
    let err = reformulate::run(
        &session(&client),
        &input,
        "dataset",
        &dir.path().join("missing.pdf"),
        &dir.path().join("out.xlsx"),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InputNotFound(_)));
    assert_eq!(client.call_count(), 0);
}
