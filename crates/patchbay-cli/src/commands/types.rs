//! Node type listing and information command.

use clap::Args;
use patchbay_config::{BuiltinRegistry, EngineConfig, NodeCategory};
use patchbay_core::{NodeTypeDescriptor, SocketDecl};
use serde_json::{Value, json};

#[derive(Args)]
pub struct TypesArgs {
    /// Show details for a specific node type
    #[arg(value_name = "TYPE")]
    type_name: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

pub fn run(args: TypesArgs, _config: &EngineConfig) -> anyhow::Result<()> {
    let registry = BuiltinRegistry::new();

    if let Some(type_name) = &args.type_name {
        let descriptor = registry
            .get(type_name)
            .ok_or_else(|| anyhow::anyhow!("Unknown node type: {}", type_name))?;
        let category = registry.category(type_name);

        if args.json {
            println!("{}", serde_json::to_string_pretty(&type_json(descriptor, category))?);
            return Ok(());
        }

        println!("{}", descriptor.type_name);
        println!("{}", "=".repeat(descriptor.type_name.len()));
        println!();
        println!("{}", descriptor.description);
        if let Some(category) = category {
            println!("Category: {}", category.name());
        }
        println!();
        print_sockets("Inputs", &descriptor.inputs);
        print_sockets("Outputs", &descriptor.outputs);
        return Ok(());
    }

    if args.json {
        let all: Vec<Value> = registry
            .all_types()
            .into_iter()
            .map(|d| type_json(d, registry.category(&d.type_name)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }

    println!("Available Node Types");
    println!("====================");
    for category in NodeCategory::ALL {
        let types = registry.types_in_category(category);
        if types.is_empty() {
            continue;
        }
        println!();
        println!("{} - {}", category.name(), category.description());
        for descriptor in types {
            println!("  {:20} - {}", descriptor.type_name, descriptor.description);
        }
    }
    println!();
    println!("Use 'patchbay types <type>' for socket details.");
    Ok(())
}

fn print_sockets(title: &str, sockets: &[SocketDecl]) {
    println!("{title}:");
    if sockets.is_empty() {
        println!("  (none)");
    }
    for socket in sockets {
        match &socket.default {
            Some(default) => println!("  {:12}  {:8}  default {}", socket.name, socket.ty.to_string(), default),
            None => println!("  {:12}  {}", socket.name, socket.ty),
        }
    }
    println!();
}

fn type_json(descriptor: &NodeTypeDescriptor, category: Option<NodeCategory>) -> Value {
    let sockets = |sockets: &[SocketDecl]| -> Vec<Value> {
        sockets
            .iter()
            .map(|s| json!({ "name": s.name, "type": s.ty.to_string(), "default": s.default }))
            .collect()
    };
    json!({
        "type": descriptor.type_name,
        "name": descriptor.display_name,
        "description": descriptor.description,
        "category": category.map(|c| c.name()),
        "inputs": sockets(&descriptor.inputs),
        "outputs": sockets(&descriptor.outputs),
    })
}
