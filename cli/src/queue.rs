//! Liquidation-queue inspection: build a queue from the command line, split
//! it at a collateral limit, and audit the tree invariants.

use anyhow::{Context, Result};
use colored::Colorize;
use warren::avl::{self, Item, Node};
use warren::{Arena, Handle};

use crate::scenario::parse_tez;

type Queue = Arena<Node<String>>;

fn parse_items(spec: &str) -> Result<Vec<Item<String>>> {
    spec.split(',')
        .map(|part| {
            let (id_s, coll_s) = part
                .split_once(':')
                .with_context(|| format!("expected id:collateral, got {part:?}"))?;
            let id: i64 = id_s
                .trim()
                .parse()
                .with_context(|| format!("bad id {id_s:?}"))?;
            let collateral = parse_tez(coll_s.trim())?;
            Ok(Item { id, payload: format!("burrow-{id}"), collateral })
        })
        .collect()
}

fn print_side(arena: &Queue, label: &str, root: Option<Handle>) {
    println!("{}", label.bold());
    let items = avl::to_list(arena, root);
    if items.is_empty() {
        println!("  (empty)");
        return;
    }
    for it in &items {
        println!("  {:>6}  {:>12}  {}", it.id, it.collateral.to_string(), it.payload.dimmed());
    }
    let total = items
        .iter()
        .fold(warren::Tez::ZERO, |acc, it| acc + it.collateral);
    println!("  {} {}", "total:".cyan(), total);
}

pub fn run(items: &str, limit: &str) -> Result<()> {
    let items = parse_items(items)?;
    let limit = parse_tez(limit)?;

    let mut arena: Queue = Arena::new();
    let mut root = None;
    for it in items {
        root = Some(avl::add(&mut arena, root, it));
    }

    let (prefix, rest) = avl::split(&mut arena, root, limit);
    avl::assert_invariants(&arena, prefix);
    avl::assert_invariants(&arena, rest);
    avl::assert_no_dangling(&arena, &[prefix, rest]);

    print_side(&arena, "selected for liquidation", prefix);
    println!();
    print_side(&arena, "remaining in queue", rest);
    println!();
    println!("{}", "tree invariants hold".green());
    Ok(())
}
