use nodeset_core::Node;

/// Decoder for the payload inside a node's `<Value>` element.
///
/// The parser forwards every element of the value subtree here and never
/// looks at the produced value itself.
pub trait ValueDecoder {
    type Value;

    /// Create an empty value for `node` when its `<Value>` element opens.
    fn new_value(&mut self, node: &Node<Self::Value>) -> Self::Value;

    /// An element inside the value subtree opened.
    fn start(&mut self, value: &mut Self::Value, element: &str);

    /// An element inside the value subtree closed with its accumulated text.
    fn end(&mut self, value: &mut Self::Value, element: &str, text: &str);

    /// The `<Value>` element itself closed.
    fn finish(&mut self, value: &mut Self::Value);
}

impl<D: ValueDecoder + ?Sized> ValueDecoder for &mut D {
    type Value = D::Value;

    fn new_value(&mut self, node: &Node<Self::Value>) -> Self::Value {
        (**self).new_value(node)
    }

    fn start(&mut self, value: &mut Self::Value, element: &str) {
        (**self).start(value, element)
    }

    fn end(&mut self, value: &mut Self::Value, element: &str, text: &str) {
        (**self).end(value, element, text)
    }

    fn finish(&mut self, value: &mut Self::Value) {
        (**self).finish(value)
    }
}

impl<D: ValueDecoder + ?Sized> ValueDecoder for Box<D> {
    type Value = D::Value;

    fn new_value(&mut self, node: &Node<Self::Value>) -> Self::Value {
        (**self).new_value(node)
    }

    fn start(&mut self, value: &mut Self::Value, element: &str) {
        (**self).start(value, element)
    }

    fn end(&mut self, value: &mut Self::Value, element: &str, text: &str) {
        (**self).end(value, element, text)
    }

    fn finish(&mut self, value: &mut Self::Value) {
        (**self).finish(value)
    }
}

/// Decoder that ignores value payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipValues;

impl ValueDecoder for SkipValues {
    type Value = ();

    fn new_value(&mut self, _node: &Node<()>) {}

    fn start(&mut self, _value: &mut (), _element: &str) {}

    fn end(&mut self, _value: &mut (), _element: &str, _text: &str) {}

    fn finish(&mut self, _value: &mut ()) {}
}

/// Text leaf of a value subtree, e.g. `ListOfInt32/Int32 = "4"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueLeaf {
    pub path: String,
    pub text: String,
}

/// Undecoded value: the text leaves of the subtree in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawValue {
    pub leaves: Vec<ValueLeaf>,
    open: Vec<String>,
}

impl RawValue {
    /// Text of the first leaf whose path ends with `element`.
    pub fn first(&self, element: &str) -> Option<&str> {
        self.leaves
            .iter()
            .find(|leaf| leaf.path.rsplit('/').next() == Some(element))
            .map(|leaf| leaf.text.as_str())
    }
}

/// Decoder recording every non-blank text leaf of the value subtree.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawValueDecoder;

impl ValueDecoder for RawValueDecoder {
    type Value = RawValue;

    fn new_value(&mut self, _node: &Node<RawValue>) -> RawValue {
        RawValue::default()
    }

    fn start(&mut self, value: &mut RawValue, element: &str) {
        value.open.push(element.to_string());
    }

    fn end(&mut self, value: &mut RawValue, _element: &str, text: &str) {
        let text = text.trim();
        if !text.is_empty() {
            value.leaves.push(ValueLeaf {
                path: value.open.join("/"),
                text: text.to_string(),
            });
        }
        value.open.pop();
    }

    fn finish(&mut self, value: &mut RawValue) {
        value.open.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeset_core::{Attributes, Nodeset};
    use ua_types::NodeClass;

    #[test]
    fn raw_decoder_records_leaf_paths() {
        let nodeset: Nodeset<RawValue> = Nodeset::new();
        let attrs: Attributes = [("NodeId", "i=5000")].into_iter().collect();
        let node = nodeset.new_node(NodeClass::Variable, &attrs).unwrap();

        let mut decoder = RawValueDecoder;
        let mut value = decoder.new_value(&node);
        decoder.start(&mut value, "ListOfInt32");
        decoder.start(&mut value, "Int32");
        decoder.end(&mut value, "Int32", "4");
        decoder.start(&mut value, "Int32");
        decoder.end(&mut value, "Int32", " 5 ");
        decoder.end(&mut value, "ListOfInt32", "\n  ");
        decoder.finish(&mut value);

        assert_eq!(
            value.leaves,
            vec![
                ValueLeaf {
                    path: "ListOfInt32/Int32".into(),
                    text: "4".into()
                },
                ValueLeaf {
                    path: "ListOfInt32/Int32".into(),
                    text: "5".into()
                },
            ]
        );
        assert_eq!(value.first("Int32"), Some("4"));
        assert_eq!(value.first("Double"), None);
    }
}
