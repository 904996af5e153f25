//! Catalog listing commands

use anyhow::{anyhow, Result};
use fingenie_core::{ResponseResolver, SchemeGroup};

pub fn cmd_terms(resolver: &ResponseResolver) -> Result<()> {
    println!();
    println!("📖 Financial terms");
    println!("   ─────────────────────────────────────────────────────────────");
    for entry in resolver.terms() {
        let flag = if entry.sensitive { " ⚠️" } else { "" };
        if entry.aliases.is_empty() {
            println!("   {}{}", entry.term, flag);
        } else {
            println!("   {} ({}){}", entry.term, entry.aliases.join(", "), flag);
        }
    }
    println!();
    Ok(())
}

pub fn cmd_schemes(resolver: &ResponseResolver, group: Option<&str>) -> Result<()> {
    let groups: Vec<SchemeGroup> = match group {
        Some(raw) => vec![raw.parse().map_err(|e: String| anyhow!(e))?],
        None => SchemeGroup::all().to_vec(),
    };

    for group in groups {
        let schemes = resolver.schemes_in(group);
        println!();
        println!("🏛️  {}", group.label());
        if schemes.is_empty() {
            println!("   (none listed)");
        }
        for scheme in schemes {
            println!("   • {}", scheme.name);
            println!("     {}", scheme.summary);
        }
    }
    println!();
    Ok(())
}

pub fn cmd_rules(resolver: &ResponseResolver) -> Result<()> {
    println!();
    println!("🔎 Resolver rules (first match wins)");
    for (i, name) in resolver.rule_names().iter().enumerate() {
        println!("   {:>2}. {}", i + 1, name);
    }
    println!("   --. fallback");
    println!();
    Ok(())
}
