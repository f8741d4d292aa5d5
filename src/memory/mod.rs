//! Core memory - labeled, size-advised text blocks compiled into the system prompt

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default soft character limit for the seeded blocks.
pub const DEFAULT_BLOCK_LIMIT: usize = 2000;

const DEFAULT_HUMAN_VALUE: &str = "Name: Chad\nPersonality: Likes 10x vibe coding.";
const DEFAULT_PERSONA_VALUE: &str = "Name: Sam\nRole: You are a helpful AI assistant \
called Sam. You are keeping track of facts in your memory.";

/// A single labeled memory block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryBlock {
    pub label: String,
    pub value: String,
    /// Soft character budget. Exceeding it warns, never fails.
    pub limit: usize,
    pub read_only: bool,
}

impl MemoryBlock {
    pub fn new(label: impl Into<String>, value: impl Into<String>, limit: usize, read_only: bool) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            limit,
            read_only,
        }
    }
}

/// Ordered collection of memory blocks keyed by label.
///
/// Labels are unique and insertion order is the only order used for
/// compilation and enumeration. A single vector carries both invariants, so
/// the keyed view and the ordered view can never drift apart.
#[derive(Debug, Default)]
pub struct CoreMemory {
    blocks: Vec<MemoryBlock>,
}

impl CoreMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the two default blocks: `human` then `persona`.
    pub fn initialize_default(&mut self) {
        self.add_block(MemoryBlock::new(
            "human",
            DEFAULT_HUMAN_VALUE,
            DEFAULT_BLOCK_LIMIT,
            false,
        ));
        self.add_block(MemoryBlock::new(
            "persona",
            DEFAULT_PERSONA_VALUE,
            DEFAULT_BLOCK_LIMIT,
            false,
        ));
    }

    /// Look up a block by exact label.
    pub fn get_block(&self, label: &str) -> Option<&MemoryBlock> {
        self.blocks.iter().find(|b| b.label == label)
    }

    /// Replace a block's value in place. Returns false if the label is
    /// absent or the block is read-only; order is never affected.
    pub fn update_block(&mut self, label: &str, new_value: impl Into<String>) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.label == label) else {
            return false;
        };
        if block.read_only {
            return false;
        }

        let new_value = new_value.into();
        if new_value.len() > block.limit {
            warn!(
                "New value for block '{}' exceeds limit ({} > {})",
                label,
                new_value.len(),
                block.limit
            );
        }

        block.value = new_value;
        true
    }

    /// Add a block. A duplicate label overwrites the existing block in
    /// place, keeping its original order position; a new label appends.
    pub fn add_block(&mut self, block: MemoryBlock) {
        if let Some(existing) = self.blocks.iter_mut().find(|b| b.label == block.label) {
            warn!("Block '{}' already exists. Overwriting.", block.label);
            *existing = block;
        } else {
            self.blocks.push(block);
        }
    }

    /// Remove a block by label. No-op with a diagnostic if absent.
    pub fn remove_block(&mut self, label: &str) {
        let before = self.blocks.len();
        self.blocks.retain(|b| b.label != label);
        if self.blocks.len() == before {
            warn!("Block '{}' not found, cannot remove.", label);
        }
    }

    /// Blocks in insertion order.
    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    /// Compile the memory into the system prompt string.
    ///
    /// Deterministic: a pure function of the current block set and order.
    pub fn compile(&self) -> String {
        let mut out = String::new();
        out.push_str(
            "You are a stateful agent. You have access to a set of tools and a memory system.\n",
        );
        out.push_str("You must use the `send_message` tool to communicate with the user.\n");
        out.push_str(
            "You must use the `core_memory_append` or `core_memory_replace` tools to update \
             your memory when you learn new facts.\n\n",
        );

        out.push_str("### Memory Blocks\n");
        for block in &self.blocks {
            out.push_str(&format!(
                "Block '{}' ({}/{} chars):\n{}\n\n",
                block.label,
                block.value.len(),
                block.limit,
                block.value
            ));
        }

        out
    }
}
