//! Pipeline stages, one module per external concern.
//!
//! ```text
//! topic
//!  │
//!  ├─ 1. Prompt    build the slide-deck prompt          (crate::prompts)
//!  ├─ 2. LLM       generate slide JSON                  (llm)
//!  ├─ 3. Normalize fence-strip + parse                  (crate::normalize)
//!  ├─ 4. Keywords  caption → search query, per slide    (keywords)
//!  ├─ 5. Images    search, download, validate, save     (images)
//!  ├─ 6. Deck      records → .pptx on disk              (deck)
//!  └─ 7. Upload    host the file, schedule deletion     (upload)
//! ```
//!
//! The evaluation pipeline reuses stages 1–3 with `extract` in front.

pub mod deck;
pub mod extract;
pub mod images;
pub mod keywords;
pub mod llm;
pub mod upload;
