//! Print an outline of every fixture under test/unk, using a custom object
//! factory and the object-closed hook.

use std::fs;
use std::path::Path;

use libunke::{Document, ObjectFactory, ObjectId, Parser, Value};

/// Numbers objects in the order their opening brace is read.
#[derive(Default)]
struct Numbering {
    next: usize,
}

impl ObjectFactory for Numbering {
    type Ext = usize;

    fn create_empty(&mut self) -> usize {
        self.next += 1;
        self.next
    }
}

fn print_object(doc: &Document<usize>, id: ObjectId, depth: usize) {
    let object = &doc[id];
    println!(
        "{}#{} {}",
        "  ".repeat(depth),
        object.ext,
        object.name().unwrap_or("<anonymous>")
    );
    for child in object.children() {
        print_object(doc, *child, depth + 1);
    }
    for (name, value) in object.properties() {
        match value {
            Value::Object(inner) => {
                println!("{}{}:", "  ".repeat(depth + 1), name);
                print_object(doc, *inner, depth + 2);
            }
            other => println!("{}{}: {:?}", "  ".repeat(depth + 1), name, other),
        }
    }
}

fn main() {
    let test_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
        .join("unk");

    let mut paths: Vec<_> = fs::read_dir(&test_dir)
        .unwrap()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|e| e == "unk").unwrap_or(false))
        .collect();
    paths.sort();

    for path in paths {
        let mut closed = Vec::new();
        let result = {
            let mut parser = Parser::with_factory(Numbering::default())
                .on_object_closed(|object| closed.push(object.ext));
            libunke::load_with(&path, &mut parser)
        };
        match result {
            Ok(doc) => {
                println!("== {}", path.display());
                if let Some(root) = doc.root() {
                    print_object(&doc, root, 0);
                }
                println!("   closed in order: {:?}", closed);
            }
            Err(e) => println!("== {}: {}", path.display(), e),
        }
    }
}
