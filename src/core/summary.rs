//! Read-only aggregation of an inventory for display before the operator confirms.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use super::models::{FolderRecord, format_bytes};

#[derive(Debug, Clone, PartialEq)]
pub struct InventorySummary<'a> {
    pub total_folders: usize,
    /// Sum over folders with a known item count.
    pub total_items: u64,
    /// Sum over folders with a known size.
    pub known_size: u64,
    pub unknown_stats: usize,
    pub mail_enabled: usize,
    /// Largest folders by item count, descending. Folders with unknown counts are excluded.
    pub top_folders: Vec<&'a FolderRecord>,
    /// Every folder in tree order: each parent directly followed by its subtree.
    pub hierarchy: Vec<&'a FolderRecord>,
}

impl<'a> InventorySummary<'a> {
    pub fn new(inventory: &'a [FolderRecord], top_n: usize) -> Self {
        let total_items = inventory.iter().filter_map(|f| f.item_count.known()).sum();
        let known_size = inventory.iter().filter_map(|f| f.total_size.known()).sum();
        let unknown_stats = inventory.iter().filter(|f| f.item_count.is_unknown()).count();
        let mail_enabled = inventory.iter().filter(|f| f.mail_enabled).count();

        Self {
            total_folders: inventory.len(),
            total_items,
            known_size,
            unknown_stats,
            mail_enabled,
            top_folders: top_by_items(inventory, top_n),
            hierarchy: tree_order(inventory),
        }
    }

    /// Console rendering of the summary.
    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Folder inventory summary");
        let _ = writeln!(out, "  Total folders:       {}", self.total_folders);
        let _ = writeln!(out, "  Total items:         {}", self.total_items);
        let _ = writeln!(out, "  Total size (known):  {}", format_bytes(self.known_size));
        let _ = writeln!(out, "  Mail-enabled:        {}", self.mail_enabled);
        if self.unknown_stats > 0 {
            let _ = writeln!(out, "  Missing statistics:  {}", self.unknown_stats);
        }

        if !self.top_folders.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Largest folders by item count:");
            for (rank, folder) in self.top_folders.iter().enumerate() {
                let items = folder.item_count.known().copied().unwrap_or_default();
                let _ = writeln!(out, "  {:>2}. {} ({} items)", rank + 1, folder.full_path(), items);
            }
        }

        if !self.hierarchy.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Folder hierarchy:");
            for folder in &self.hierarchy {
                let indent = "  ".repeat(folder.depth());
                let _ = writeln!(out, "{}{}", indent, folder.name);
            }
        }

        out
    }
}

fn top_by_items(inventory: &[FolderRecord], n: usize) -> Vec<&FolderRecord> {
    let mut ranked: Vec<(u64, &FolderRecord)> = inventory
        .iter()
        .filter_map(|f| f.item_count.known().map(|count| (*count, f)))
        .collect();
    // sort_by is stable, so ties keep inventory order.
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().take(n).map(|(_, f)| f).collect()
}

/// Each folder followed by its subtree. Siblings keep inventory order, and folders whose
/// parent is not in the inventory are treated as roots.
fn tree_order(inventory: &[FolderRecord]) -> Vec<&FolderRecord> {
    let paths: HashSet<String> = inventory.iter().map(|f| f.full_path()).collect();
    let mut children: HashMap<&str, Vec<&FolderRecord>> = HashMap::new();
    let mut roots = Vec::new();
    for folder in inventory {
        if paths.contains(folder.parent_path.as_str()) {
            children.entry(folder.parent_path.as_str()).or_default().push(folder);
        } else {
            roots.push(folder);
        }
    }

    let mut ordered = Vec::with_capacity(inventory.len());
    let mut stack: Vec<&FolderRecord> = roots.into_iter().rev().collect();
    while let Some(folder) = stack.pop() {
        ordered.push(folder);
        if let Some(kids) = children.get(folder.full_path().as_str()) {
            stack.extend(kids.iter().rev());
        }
    }
    ordered
}
