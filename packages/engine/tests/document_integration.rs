//! Integration tests for document construction.
//!
//! Builds complete documents through the public API and checks the output
//! against fixtures and an independent XML parser.

use std::fs;
use std::path::Path;
use std::thread;

use pretty_assertions::assert_eq;
use xmlscope_engine::{
    BuildError, BuiltDocument, ContextStack, Document, DocumentBuilder, ElementArgs, Namespace,
    Node, ResolutionPolicy, Result, Scoped, SerializeOptions,
};

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

/// Assert that `text` parses as XML and return the root tag.
fn parsed_root_tag(text: &str) -> String {
    let doc = roxmltree::Document::parse(text).expect("Output should be well-formed XML");
    doc.root_element().tag_name().name().to_string()
}

fn compose_inventory(ns: &mut Namespace, items: &[&str]) -> Result<()> {
    let mut html = ns.element("html")?;
    let mut head = ns.element("head")?;
    let mut title = ns.element("title")?;
    let mut body = ns.element("body")?;
    let mut h1 = ns.element("h1")?;
    let mut ul = ns.element("ul")?;
    let mut li = ns.element("li")?;
    let mut br = ns.element("br")?;
    let mut comment = ns.comment()?;

    let root = html
        .build(ElementArgs::new().attr("lang", "en"))
        .scope(|root| {
            head.build_empty().scope(|_| {
                title.build("Inventory");
                Ok(())
            })?;
            body.build_empty().scope(|_| {
                comment.text(" generated ");
                h1.build(ElementArgs::new().text("Items").attr("class", "title"));
                ul.build(ElementArgs::new().attr("id", "items")).scope(|_| {
                    for (index, item) in items.iter().enumerate() {
                        li.build(ElementArgs::new().text(*item).attr("data-index", index));
                    }
                    Ok(())
                })?;
                br.build_empty();
                Ok(())
            })?;
            Ok(root.clone())
        })?;

    ns.bind_root(root);
    Ok(())
}

fn inventory(items: &[&str]) -> BuiltDocument {
    DocumentBuilder::new()
        .context(ContextStack::new())
        .build(|ns| compose_inventory(ns, items))
        .expect("Inventory should build")
}

#[test]
fn test_inventory_matches_fixture() {
    let document = inventory(&["apple", "pear & plum"]);
    let text = document
        .serialize(&SerializeOptions::new().doctype("html").pretty(true))
        .unwrap();

    assert_eq!(text, load_fixture("inventory.xml").trim_end());
}

#[test]
fn test_inventory_is_well_formed() {
    let document = inventory(&["a", "<b>", "\"c\""]);
    let text = document
        .serialize(&SerializeOptions::new().declaration(true))
        .unwrap();

    assert_eq!(parsed_root_tag(&text), "html");

    let doc = roxmltree::Document::parse(&text).unwrap();
    let items: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name("li"))
        .map(|n| (n.attribute("data-index").unwrap(), n.text().unwrap()))
        .collect();
    assert_eq!(items, vec![("0", "a"), ("1", "<b>"), ("2", "\"c\"")]);
}

#[test]
fn test_cross_session_append() {
    // Built on its own stack, then grafted into a second document
    let widget = DocumentBuilder::new()
        .context(ContextStack::new())
        .build(|ns| {
            let mut section = ns.element("section")?;
            let mut p = ns.element("p")?;
            let root = section
                .build(ElementArgs::new().attr("class", "widget"))
                .scope(|root| {
                    p.build("from another stack");
                    Ok(root.clone())
                })?;
            ns.bind_root(root);
            Ok(())
        })
        .unwrap()
        .into_root();

    let page = DocumentBuilder::new()
        .context(ContextStack::new())
        .build(|ns| {
            let mut html = ns.element("html")?;
            let mut body = ns.element("body")?;
            let root = html.build_empty().scope(|root| {
                body.build_empty().append(&widget)?;
                Ok(root.clone())
            })?;
            ns.bind_root(root);
            Ok(())
        })
        .unwrap();

    assert_eq!(
        page.serialize(&SerializeOptions::default()).unwrap(),
        "<html><body><section class=\"widget\"><p>from another stack</p></section></body></html>"
    );
}

#[test]
fn test_nested_session_on_open_stack() {
    // A session on a stack with an open scope attaches into that scope
    let context = ContextStack::new();
    let outer = DocumentBuilder::new()
        .context(context.clone())
        .build(|ns| {
            let mut div = ns.element("div")?;
            let root = div.build_empty().scope(|root| {
                DocumentBuilder::new()
                    .context(ns.context().clone())
                    .build(|inner| {
                        let mut span = inner.element("span")?;
                        let node = span.build("inner").element().cloned();
                        if let Some(node) = node {
                            inner.bind_root(node);
                        }
                        Ok(())
                    })?;
                Ok(root.clone())
            })?;
            ns.bind_root(root);
            Ok(())
        })
        .unwrap();

    assert!(context.is_empty());
    assert_eq!(
        outer.root().to_xml().unwrap(),
        "<div><span>inner</span></div>"
    );
}

#[test]
fn test_independent_documents_build_in_parallel() {
    let handles: Vec<_> = (0..4)
        .map(|n| {
            thread::spawn(move || {
                let name = format!("item-{n}");
                inventory(&[name.as_str()])
                    .serialize(&SerializeOptions::default())
                    .unwrap()
            })
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        let text = handle.join().unwrap();
        assert!(text.contains(&format!("<li data-index=\"0\">item-{n}</li>")));
        assert_eq!(parsed_root_tag(&text), "html");
    }
}

#[test]
fn test_shared_stack_sequential_builds() {
    for _ in 0..3 {
        let document = DocumentBuilder::new()
            .build(|ns| compose_inventory(ns, &["x"]))
            .unwrap();
        assert_eq!(document.root().child_count(), 2);
    }
    assert!(ContextStack::shared().is_empty());
}

#[test]
fn test_policy_errors_surface_from_build() {
    let result = DocumentBuilder::new()
        .allow(["html", "head", "title", "body", "h1", "ul", "li"])
        .context(ContextStack::new())
        .build(|ns| compose_inventory(ns, &[]));
    assert!(matches!(result, Err(BuildError::UnresolvedName(name)) if name == "br"));

    let result = DocumentBuilder::new()
        .deny(["h1"])
        .context(ContextStack::new())
        .build(|ns| compose_inventory(ns, &[]));
    assert!(matches!(result, Err(BuildError::BlockedName(name)) if name == "h1"));
}

struct Feed;

impl Document for Feed {
    fn compose(ns: &mut Namespace) -> Result<()> {
        let mut feed = ns.element("feed")?;
        let mut entry = ns.element("entry")?;
        let mut link = ns.element("link")?;

        let root = feed
            .build(ElementArgs::new().namespace(None, "http://www.w3.org/2005/Atom"))
            .scope(|root| {
                for id in 1..=2 {
                    entry.build_empty().scope(|_| {
                        link.build(
                            ElementArgs::new()
                                .attr("href", format!("/entries/{id}"))
                                .attr_opt("rel", (id == 1).then_some("first")),
                        );
                        Ok(())
                    })?;
                }
                Ok(root.clone())
            })?;

        if let Some(last) = entry.element() {
            ns.bind("last_entry", last);
        }
        ns.bind_root(root);
        Ok(())
    }

    fn policy() -> ResolutionPolicy {
        ResolutionPolicy::allow_only(["feed", "entry", "link"])
    }
}

#[test]
fn test_document_trait_renders() {
    let text = Feed::render(&SerializeOptions::new().declaration(true)).unwrap();

    assert_eq!(
        text,
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <feed xmlns=\"http://www.w3.org/2005/Atom\">\
         <entry><link href=\"/entries/1\" rel=\"first\"/></entry>\
         <entry><link href=\"/entries/2\"/></entry>\
         </feed>"
    );

    let doc = roxmltree::Document::parse(&text).unwrap();
    assert_eq!(
        doc.root_element().tag_name().namespace(),
        Some("http://www.w3.org/2005/Atom")
    );
}

#[test]
fn test_document_trait_bindings() {
    let document = Feed::build().unwrap();
    let last = document
        .binding("last_entry")
        .and_then(Node::as_element)
        .unwrap();

    let link = last.children()[0].as_element().cloned().unwrap();
    assert_eq!(link.attribute("href").as_deref(), Some("/entries/2"));
    assert!(link.attribute("rel").is_none());
    assert_eq!(document.root().child_count(), 2);
}
