#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;

use calamine::{Reader, open_workbook_auto};
use review_themes::completion::{CompletionClient, CompletionRequest, Role};
use review_themes::error::Result;
use review_themes::prompts::PromptEngine;
use review_themes::session::{Session, Throttle};
use rust_xlsxwriter::Workbook;

type Handler = Box<dyn Fn(&CompletionRequest) -> Result<String>>;

/// Completion client answering every request through a closure.
pub struct ScriptedClient {
    handler: Handler,
    calls: RefCell<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(handler: impl Fn(&CompletionRequest) -> Result<String> + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.borrow().clone()
    }
}

impl CompletionClient for ScriptedClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.borrow_mut().push(request.clone());
        (self.handler)(request)
    }
}

pub fn session(client: &ScriptedClient) -> Session<&ScriptedClient> {
    Session::new(client, PromptEngine::new(None), "gpt-4o", Throttle::none())
}

pub fn system_prompt(request: &CompletionRequest) -> &str {
    request.message(Role::System).unwrap_or_default()
}

pub fn user_prompt(request: &CompletionRequest) -> &str {
    request.message(Role::User).unwrap_or_default()
}

/// Write a single-sheet workbook with a header row and string cells. Empty
/// values are left blank.
pub fn write_workbook(path: &Path, sheet: &str, headers: &[&str], rows: &[Vec<&str>]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).unwrap();
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(r as u32 + 1, col as u16, *value)
                .unwrap();
        }
    }
    workbook.save(path).unwrap();
}

/// Every row of the first worksheet, header included, as text.
pub fn read_back(path: &Path) -> Vec<Vec<String>> {
    let mut workbook = open_workbook_auto(path).unwrap();
    let name = workbook.sheet_names()[0].clone();
    let range = workbook.worksheet_range(&name).unwrap();
    range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}
