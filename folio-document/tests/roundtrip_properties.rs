mod common;

use common::{document, snapshot, top_level};
use folio_document::Document;
use folio_types::ObjectId;
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
struct Node {
    parent: usize,
    group: bool,
    label: String,
    count: i32,
}

fn node() -> impl Strategy<Value = Node> {
    (any::<usize>(), any::<bool>(), "[a-z ]{0,12}", any::<i32>()).prop_map(
        |(parent, group, label, count)| Node {
            parent,
            group,
            label,
            count,
        },
    )
}

fn build(nodes: &[Node]) -> Document {
    let mut doc = document();
    let mut groups: Vec<ObjectId> = Vec::new();
    for n in nodes {
        let slots = groups.len() + 1;
        let parent = groups.get(n.parent % slots).copied();
        if n.group {
            let id = doc.add_object("Group", parent, None).unwrap();
            doc.set_property(id, "label", json!(n.label)).unwrap();
            doc.set_property(id, "count", json!(n.count)).unwrap();
            groups.push(id);
        } else {
            let id = doc.add_object("Note", parent, None).unwrap();
            doc.set_property(id, "text", json!(n.label)).unwrap();
        }
    }
    doc
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decode_of_encode_reproduces_the_graph(nodes in prop::collection::vec(node(), 0..30)) {
        let original = build(&nodes);
        let bytes = original.encode().unwrap();

        let mut copy = document();
        copy.decode(&bytes).unwrap();

        prop_assert_eq!(snapshot(&copy), snapshot(&original));
        prop_assert_eq!(top_level(&copy), top_level(&original));
        prop_assert_eq!(copy.document_id(), original.document_id());
        prop_assert!(copy.tree().check_integrity().is_ok());
    }
}
