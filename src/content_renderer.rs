use serde::{Deserialize, Serialize};

use crate::book::{Item, ItemKind};
use crate::checklist::{ChecklistKey, ChecklistStore, Progress};
use crate::markup::{self, EntryDepth, InlineRun, ParsedNode};
use crate::storage::KeyValueStore;

/// Auxiliary callouts attached to a card when its text contains a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decoration {
    PlanBadge,
    MusicBadge,
    ExampleTip,
}

impl Decoration {
    pub fn glyph(&self) -> &'static str {
        match self {
            Decoration::PlanBadge => "✔",
            Decoration::MusicBadge => "♫",
            Decoration::ExampleTip => "▶",
        }
    }

    pub fn caption(&self) -> Option<&'static str> {
        match self {
            Decoration::ExampleTip => Some("Example Tip"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorationRule {
    pub marker: String,
    pub decoration: Decoration,
}

impl DecorationRule {
    pub fn new(marker: impl Into<String>, decoration: Decoration) -> Self {
        Self {
            marker: marker.into(),
            decoration,
        }
    }
}

pub fn default_decoration_rules() -> Vec<DecorationRule> {
    vec![
        DecorationRule::new("Free Plan", Decoration::PlanBadge),
        DecorationRule::new("Pro Plan", Decoration::PlanBadge),
        DecorationRule::new("GMIV", Decoration::MusicBadge),
        DecorationRule::new("Mumble", Decoration::MusicBadge),
        DecorationRule::new("예시:", Decoration::ExampleTip),
        DecorationRule::new("Example:", Decoration::ExampleTip),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardBlock {
    Paragraph(Vec<InlineRun>),
    Code {
        language: Option<String>,
        text: String,
        /// Position among the card's code blocks, used as the copy target id.
        block_index: usize,
    },
    ChecklistEntry {
        label: Vec<InlineRun>,
        line_index: usize,
        depth: EntryDepth,
        checked: bool,
    },
    ChecklistHeader(Vec<InlineRun>),
    Bullet(Vec<InlineRun>),
    Plain(Vec<InlineRun>),
    Spacer,
}

/// Display structure for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub key: ChecklistKey,
    pub kind: ItemKind,
    pub blocks: Vec<CardBlock>,
    pub decorations: Vec<Decoration>,
    pub progress: Option<Progress>,
}

impl Card {
    pub fn code_blocks(&self) -> impl Iterator<Item = (usize, &str)> {
        self.blocks.iter().filter_map(|block| match block {
            CardBlock::Code {
                text, block_index, ..
            } => Some((*block_index, text.as_str())),
            _ => None,
        })
    }
}

pub struct ContentRenderer {
    rules: Vec<DecorationRule>,
}

impl Default for ContentRenderer {
    fn default() -> Self {
        Self::new(default_decoration_rules())
    }
}

impl ContentRenderer {
    pub fn new(rules: Vec<DecorationRule>) -> Self {
        Self { rules }
    }

    /// Builds the card for `item`. Checklist items are attached to `store`
    /// under `key` the first time they are rendered.
    pub fn render(
        &self,
        item: &Item,
        key: &ChecklistKey,
        store: &mut ChecklistStore,
        storage: &dyn KeyValueStore,
    ) -> Card {
        let nodes = markup::parse_item(item);

        if item.kind() == ItemKind::Checklist && !store.is_attached(key) {
            let checkable = nodes
                .iter()
                .filter_map(|node| match node {
                    ParsedNode::ChecklistLine { line_index, .. } => Some(*line_index),
                    _ => None,
                })
                .collect();
            store.attach(storage, key, checkable);
        }

        let mut code_index = 0;
        let blocks = nodes
            .into_iter()
            .map(|node| match node {
                ParsedNode::Paragraph(runs) => CardBlock::Paragraph(runs),
                ParsedNode::CodeBlock { language, text } => {
                    let block = CardBlock::Code {
                        language,
                        text,
                        block_index: code_index,
                    };
                    code_index += 1;
                    block
                }
                ParsedNode::ChecklistLine {
                    ref raw,
                    line_index,
                    depth,
                } => {
                    let label = node.label().unwrap_or(raw.as_str());
                    CardBlock::ChecklistEntry {
                        label: markup::parse_inline(label),
                        line_index,
                        depth,
                        checked: store.is_checked(key, line_index),
                    }
                }
                ParsedNode::HeaderLine(_) => {
                    CardBlock::ChecklistHeader(markup::parse_inline(node.label().unwrap_or("")))
                }
                ParsedNode::BulletLine(_) => {
                    CardBlock::Bullet(markup::parse_inline(node.label().unwrap_or("")))
                }
                ParsedNode::PlainLine(_) => {
                    CardBlock::Plain(markup::parse_inline(node.label().unwrap_or("")))
                }
                ParsedNode::BlankLine => CardBlock::Spacer,
            })
            .collect();

        let progress = match item.kind() {
            ItemKind::Checklist => Some(store.progress(key)),
            ItemKind::Prose => None,
        };

        Card {
            key: key.clone(),
            kind: item.kind(),
            blocks,
            decorations: self.decorations_for(item.text()),
            progress,
        }
    }

    /// Plain substring matching against the raw item text, markup included.
    pub fn decorations_for(&self, text: &str) -> Vec<Decoration> {
        let mut decorations = Vec::new();
        for rule in &self.rules {
            if text.contains(rule.marker.as_str()) && !decorations.contains(&rule.decoration) {
                decorations.push(rule.decoration);
            }
        }
        decorations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StateStore;

    #[test]
    fn test_checklist_card_reflects_store() {
        let mut storage = StateStore::ephemeral();
        let mut store = ChecklistStore::new();
        let renderer = ContentRenderer::default();
        let key = ChecklistKey::section("s", 0);
        let item = Item::from_text("# Prep\n* [ ] **Export** stems\n  - [ ] Normalize\n- note");

        let card = renderer.render(&item, &key, &mut store, &storage);
        assert_eq!(card.progress, Some(Progress::new(0, 2)));
        assert_eq!(
            card.blocks[1],
            CardBlock::ChecklistEntry {
                label: vec![
                    InlineRun::Bold("Export".to_string()),
                    InlineRun::PlainText(" stems".to_string()),
                ],
                line_index: 1,
                depth: EntryDepth::Main,
                checked: false,
            }
        );

        store.toggle(&mut storage, &key, 2);
        let card = renderer.render(&item, &key, &mut store, &storage);
        assert!(matches!(
            card.blocks[2],
            CardBlock::ChecklistEntry { checked: true, depth: EntryDepth::Sub, .. }
        ));
        assert_eq!(card.progress.map(|p| p.percent), Some(50));
    }

    #[test]
    fn test_prose_card_has_no_progress() {
        let storage = StateStore::ephemeral();
        let mut store = ChecklistStore::new();
        let key = ChecklistKey::section("s", 1);
        let card = ContentRenderer::default().render(
            &Item::from_text("Hello\n\n```sh\necho hi\n```\n\n```\ntwo\n```"),
            &key,
            &mut store,
            &storage,
        );
        assert!(card.progress.is_none());
        assert!(!store.is_attached(&key));
        let codes: Vec<(usize, &str)> = card.code_blocks().collect();
        assert_eq!(codes, vec![(0, "echo hi"), (1, "two")]);
    }

    #[test]
    fn test_decorations_use_exact_substrings() {
        let renderer = ContentRenderer::default();
        assert_eq!(
            renderer.decorations_for("The **Free Plan** and the Pro Plan"),
            vec![Decoration::PlanBadge]
        );
        assert_eq!(
            renderer.decorations_for("예시: one mix per week"),
            vec![Decoration::ExampleTip]
        );
        assert!(renderer.decorations_for("free plan").is_empty());
        assert!(renderer.decorations_for("Free **Plan**").is_empty());
    }
}
