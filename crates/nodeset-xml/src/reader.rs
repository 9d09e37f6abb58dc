use std::io::BufRead;

use nodeset_core::{Attributes, Nodeset};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::parser::NodesetParser;
use crate::value::ValueDecoder;
use crate::ParseError;

/// Read size used by callers that open files themselves.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Parse an in-memory NodeSet document.
pub fn parse_str<D, R>(xml: &str, decoder: D, remap: R) -> Result<Nodeset<D::Value>, ParseError>
where
    D: ValueDecoder,
    R: FnMut(&str) -> u16,
{
    parse_reader(xml.as_bytes(), decoder, remap)
}

/// Parse a NodeSet document from `input` in a single pass.
///
/// `input` is pulled as the tokenizer needs more bytes; wrap files in a
/// `BufReader` sized to the desired chunk length.
pub fn parse_reader<I, D, R>(input: I, decoder: D, remap: R) -> Result<Nodeset<D::Value>, ParseError>
where
    I: BufRead,
    D: ValueDecoder,
    R: FnMut(&str) -> u16,
{
    let mut reader = Reader::from_reader(input);
    reader.expand_empty_elements(true);
    let mut parser = NodesetParser::new(decoder, remap);
    let mut buf = Vec::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(err) => return Err(xml_error(reader.buffer_position(), err)),
        };
        let position = reader.buffer_position();
        match event {
            Event::Start(e) => {
                let attrs = attributes(&e, position)?;
                parser.start_element(utf8(e.local_name().as_ref(), position)?, &attrs)?;
            }
            Event::End(e) => {
                parser.end_element(utf8(e.local_name().as_ref(), position)?)?;
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|err| xml_error(position, err))?;
                parser.characters(&text);
            }
            Event::CData(e) => {
                parser.characters(utf8(&e, position)?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    parser.finish()
}

fn attributes(event: &BytesStart<'_>, position: usize) -> Result<Attributes, ParseError> {
    let mut attrs = Attributes::new();
    for attr in event.attributes() {
        let attr = attr.map_err(|err| xml_error(position, err))?;
        let value = attr
            .unescape_value()
            .map_err(|err| xml_error(position, err))?;
        attrs.push(utf8(attr.key.local_name().as_ref(), position)?, value);
    }
    Ok(attrs)
}

fn utf8(bytes: &[u8], position: usize) -> Result<&str, ParseError> {
    std::str::from_utf8(bytes).map_err(|err| xml_error(position, err))
}

fn xml_error(position: usize, err: impl std::fmt::Display) -> ParseError {
    ParseError::Xml {
        position,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{RawValueDecoder, SkipValues};
    use nodeset_core::{NodesetError, OrderingPolicy};
    use std::io::BufReader;
    use ua_types::{NodeClass, NodeId, QualifiedName};

    const FIXTURE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<UANodeSet xmlns="http://opcfoundation.org/UA/2011/03/UANodeSet.xsd"
           xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <NamespaceUris>
    <Uri>http://example.org/UA/</Uri>
  </NamespaceUris>
  <Models>
    <Model ModelUri="http://example.org/UA/" Version="1.0.0">
      <RequiredModel ModelUri="http://opcfoundation.org/UA/" Version="1.04"/>
    </Model>
  </Models>
  <Aliases>
    <Alias Alias="Double">i=11</Alias>
    <Alias Alias="HasSubtype">i=45</Alias>
    <Alias Alias="HasTypeDefinition">i=40</Alias>
    <Alias Alias="HasComponent">i=47</Alias>
  </Aliases>
  <Extensions>
    <Extension><Vendor Name="acme"/></Extension>
  </Extensions>
  <UAVariable NodeId="ns=1;i=1001" BrowseName="1:Temperature" DataType="Double" ParentNodeId="ns=1;i=1000">
    <DisplayName>Temperature</DisplayName>
    <Description>Boiler &amp; pipe temperature</Description>
    <References>
      <Reference ReferenceType="HasTypeDefinition">i=63</Reference>
      <Reference ReferenceType="HasComponent" IsForward="false">ns=1;i=1000</Reference>
    </References>
    <Value>
      <Double xmlns="http://opcfoundation.org/UA/2008/02/Types.xsd">21.5</Double>
    </Value>
  </UAVariable>
  <UAObjectType NodeId="ns=1;i=1000" BrowseName="1:BoilerType">
    <DisplayName><![CDATA[Boiler]]>Type</DisplayName>
    <References>
      <Reference ReferenceType="HasSubtype" IsForward="false">i=58</Reference>
    </References>
  </UAObjectType>
  <UAMethod NodeId="ns=1;s=Boiler.Reset" BrowseName="1:Reset"/>
</UANodeSet>
"#;

    #[test]
    fn parse_fixture_document() {
        let nodeset = parse_str(FIXTURE, RawValueDecoder, |_: &str| 2).expect("parse fixture");
        assert_eq!(nodeset.len(), 3);
        assert_eq!(nodeset.alias_count(), 4);
        assert_eq!(nodeset.namespaces().len(), 1);

        let variable = nodeset.node(&NodeId::numeric(2, 1001)).expect("variable");
        assert_eq!(variable.class, NodeClass::Variable);
        assert_eq!(variable.browse_name, Some(QualifiedName::new(2, "Temperature")));
        assert_eq!(variable.parent, Some(NodeId::numeric(2, 1000)));
        assert_eq!(variable.display_name.as_deref(), Some("Temperature"));
        assert_eq!(
            variable.description.as_deref(),
            Some("Boiler & pipe temperature")
        );
        assert_eq!(variable.data_type(), Some(&NodeId::numeric(0, 11)));
        assert_eq!(variable.references.len(), 2);
        assert_eq!(
            variable.value.as_ref().and_then(|v| v.first("Double")),
            Some("21.5")
        );

        let object_type = nodeset.node(&NodeId::numeric(2, 1000)).expect("type");
        assert_eq!(object_type.display_name.as_deref(), Some("BoilerType"));

        let method = nodeset
            .node(&NodeId::string(2, "Boiler.Reset"))
            .expect("self-closing method");
        assert!(method.references.is_empty());
    }

    #[test]
    fn fixture_sorts_type_before_instance() {
        let nodeset = parse_str(FIXTURE, SkipValues, |_: &str| 2).unwrap();
        let order: Vec<_> = nodeset
            .sorted(&OrderingPolicy::default())
            .unwrap()
            .into_iter()
            .map(|n| n.id.clone())
            .collect();
        assert_eq!(
            order,
            vec![
                NodeId::numeric(2, 1000),
                NodeId::numeric(2, 1001),
                NodeId::string(2, "Boiler.Reset"),
            ]
        );
    }

    #[test]
    fn small_chunks_produce_the_same_graph() {
        let whole = parse_str(FIXTURE, SkipValues, |_: &str| 2).unwrap();
        let chunked = parse_reader(
            BufReader::with_capacity(7, FIXTURE.as_bytes()),
            SkipValues,
            |_: &str| 2,
        )
        .unwrap();
        let ids = |set: &Nodeset<()>| set.nodes().iter().map(|n| n.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&whole), ids(&chunked));
        let names = |set: &Nodeset<()>| {
            set.nodes()
                .iter()
                .map(|n| n.display_name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&whole), names(&chunked));
    }

    #[test]
    fn malformed_xml_aborts() {
        let xml = "<UANodeSet><UAObject NodeId=\"i=1\"></UAVariable></UANodeSet>";
        let err = parse_str(xml, SkipValues, |_: &str| 1).unwrap_err();
        assert!(matches!(err, ParseError::Xml { .. }), "{err}");
    }

    #[test]
    fn duplicate_node_aborts() {
        let xml = r#"<UANodeSet>
            <UAObject NodeId="i=5000"/>
            <UAObjectType NodeId="i=5000"/>
        </UANodeSet>"#;
        let err = parse_str(xml, SkipValues, |_: &str| 1).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Nodeset(NodesetError::DuplicateNode(_))
        ));
    }

    #[test]
    fn unclosed_document_is_reported() {
        let xml = "<UANodeSet><UAObject NodeId=\"i=1\">";
        assert!(parse_str(xml, SkipValues, |_: &str| 1).is_err());
    }

    #[test]
    fn missing_root_end_tag_is_reported() {
        for xml in [
            "<UANodeSet><UAObject NodeId=\"i=5001\"/>",
            "<UANodeSet><UAObject NodeId=\"i=5001\"></UAObject>",
            "<UANodeSet><Aliases><Alias Alias=\"X\">i=1</Alias>",
        ] {
            let err = parse_str(xml, SkipValues, |_: &str| 1).unwrap_err();
            assert!(matches!(err, ParseError::UnexpectedEof(_)), "{xml}: {err}");
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        for xml in ["", "<?xml version=\"1.0\"?>\n", "   \n"] {
            let err = parse_str(xml, SkipValues, |_: &str| 1).unwrap_err();
            assert!(matches!(err, ParseError::EmptyDocument), "{xml:?}: {err}");
        }
    }

    #[test]
    fn alias_declared_after_its_use_is_unresolved() {
        let xml = r#"<UANodeSet>
  <UAObject NodeId="i=5010">
    <References>
      <Reference ReferenceType="HasComponent" IsForward="false">i=85</Reference>
    </References>
  </UAObject>
  <Aliases>
    <Alias Alias="HasComponent">i=47</Alias>
  </Aliases>
</UANodeSet>"#;
        let err = parse_str(xml, SkipValues, |_: &str| 1).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Nodeset(NodesetError::UnresolvedAlias(ref name)) if name == "HasComponent"
        ));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn chunk_boundaries_do_not_change_text(capacity in 1usize..96) {
            let nodeset = parse_reader(
                BufReader::with_capacity(capacity, FIXTURE.as_bytes()),
                RawValueDecoder,
                |_: &str| 2,
            )
            .unwrap();
            let variable = nodeset.node(&NodeId::numeric(2, 1001)).unwrap();
            prop_assert_eq!(
                variable.description.as_deref(),
                Some("Boiler & pipe temperature")
            );
            prop_assert_eq!(
                variable.value.as_ref().and_then(|v| v.first("Double")),
                Some("21.5")
            );
            let object_type = nodeset.node(&NodeId::numeric(2, 1000)).unwrap();
            prop_assert_eq!(object_type.display_name.as_deref(), Some("BoilerType"));
        }
    }
}
