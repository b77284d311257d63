//! XML output.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use etl_model::{Table, XmlConfig};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::WriteError;

/// Write the table as `<root_tag>` wrapping one `<row_tag>` per row, with
/// one child element per target column. Text content is escaped by the
/// event writer.
pub(crate) fn write_xml(table: &Table, config: &XmlConfig, path: &Path) -> Result<(), WriteError> {
    write_events(table, config, path).map_err(|source| WriteError::Xml {
        path: path.to_path_buf(),
        source,
    })
}

fn write_events(table: &Table, config: &XmlConfig, path: &Path) -> Result<(), quick_xml::Error> {
    let file = File::create(path)?;
    let mut xml = Writer::new_with_indent(BufWriter::new(file), b' ', 2);

    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    xml.write_event(Event::Start(BytesStart::new(config.root_tag.as_str())))?;
    for row in 0..table.height() {
        xml.write_event(Event::Start(BytesStart::new(config.row_tag.as_str())))?;
        for column in table.columns() {
            write_text_element(&mut xml, &column.name, &column.values[row].render())?;
        }
        xml.write_event(Event::End(BytesEnd::new(config.row_tag.as_str())))?;
    }
    xml.write_event(Event::End(BytesEnd::new(config.root_tag.as_str())))?;
    Ok(())
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
