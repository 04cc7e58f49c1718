//! Test doubles shared by the analysis, store and route tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm_client::retry::TransientKind;
use crate::llm_client::{LlmError, TextGenerator};

/// A `TextGenerator` that replays a fixed script of responses in order and
/// records every prompt it receives.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(text: &str) -> Result<String, LlmError> {
        Ok(text.to_string())
    }

    pub fn transient(kind: TransientKind) -> Result<String, LlmError> {
        Err(LlmError::Transient {
            kind,
            status: None,
            message: "scripted transient failure".to_string(),
        })
    }

    pub fn permanent(status: u16) -> Result<String, LlmError> {
        Err(LlmError::Api {
            status,
            message: "scripted permanent failure".to_string(),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(prompt, system)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), system.to_string()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Self::permanent(599))
    }
}

/// Builds a minimal single-font PDF with one page per entry. An empty entry
/// produces a page with an empty content stream.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    const FIRST_PAGE_ID: usize = 4;

    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", FIRST_PAGE_ID + 2 * i))
        .collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    for (i, text) in pages.iter().enumerate() {
        let content_id = FIRST_PAGE_ID + 2 * i + 1;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
        ));
        let stream = if text.is_empty() {
            String::new()
        } else {
            let escaped = text
                .replace('\\', "\\\\")
                .replace('(', "\\(")
                .replace(')', "\\)");
            format!("BT /F1 12 Tf 72 720 Td ({escaped}) Tj ET")
        };
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    out
}
