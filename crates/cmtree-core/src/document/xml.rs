//! Canonical configuration document
//!
//! ```xml
//! <raml version="2.0" xmlns="raml20.xsd">
//!   <cmData type="plan">
//!     <header><log dateTime="2024-05-01T10:00:00" action="created"/></header>
//!     <managedObject class="ns:CLASS" distName="ROOT-1/CLASS-2" version="1.0" operation="update">
//!       <p name="x">20</p>
//!       <list name="tags"><p>a</p><p>b</p></list>
//!       <list name="levels"><item><p name="lo">1</p></item></list>
//!     </managedObject>
//!   </cmData>
//! </raml>
//! ```
//!
//! The reader accepts the same shape and ignores the header. Surrounding
//! whitespace of text values is not preserved.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::diff::Changeset;
use crate::errors::{CmError, Result};
use crate::model::{DistName, ListValue, ManagedObject, OperationTag, Record};

const EL_ROOT: &str = "raml";
const EL_DATA: &str = "cmData";
const EL_HEADER: &str = "header";
const EL_LOG: &str = "log";
const EL_OBJECT: &str = "managedObject";
const EL_PARAM: &str = "p";
const EL_LIST: &str = "list";
const EL_ITEM: &str = "item";

const DOCUMENT_VERSION: &str = "2.0";
const DOCUMENT_NAMESPACE: &str = "raml20.xsd";
const DATA_TYPE: &str = "plan";

/// Optional `<header>` block of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeader {
    pub date_time: DateTime<Utc>,
    pub action: String,
}

impl DocumentHeader {
    pub fn created_at(date_time: DateTime<Utc>) -> Self {
        Self {
            date_time,
            action: "created".to_string(),
        }
    }

    pub fn created_now() -> Self {
        Self::created_at(Utc::now())
    }
}

/// Render the objects of a change-set
///
/// # Errors
///
/// `Document` if the writer fails.
pub fn render_changeset(changeset: &Changeset, header: Option<&DocumentHeader>) -> Result<String> {
    render_document(changeset.iter().map(|e| &e.object), header)
}

/// Render objects in the given order
///
/// # Errors
///
/// `Document` if the writer fails.
pub fn render_document<'a, I>(objects: I, header: Option<&DocumentHeader>) -> Result<String>
where
    I: IntoIterator<Item = &'a ManagedObject>,
{
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new(EL_ROOT);
    root.push_attribute(("version", DOCUMENT_VERSION));
    root.push_attribute(("xmlns", DOCUMENT_NAMESPACE));
    writer.write_event(Event::Start(root))?;

    let mut data = BytesStart::new(EL_DATA);
    data.push_attribute(("type", DATA_TYPE));
    writer.write_event(Event::Start(data))?;

    if let Some(header) = header {
        writer.write_event(Event::Start(BytesStart::new(EL_HEADER)))?;
        let stamp = header.date_time.format("%Y-%m-%dT%H:%M:%S").to_string();
        let mut log = BytesStart::new(EL_LOG);
        log.push_attribute(("dateTime", stamp.as_str()));
        log.push_attribute(("action", header.action.as_str()));
        writer.write_event(Event::Empty(log))?;
        writer.write_event(Event::End(BytesEnd::new(EL_HEADER)))?;
    }

    for obj in objects {
        write_object(&mut writer, obj)?;
    }

    writer.write_event(Event::End(BytesEnd::new(EL_DATA)))?;
    writer.write_event(Event::End(BytesEnd::new(EL_ROOT)))?;

    String::from_utf8(writer.into_inner()).map_err(|e| CmError::Document {
        reason: e.to_string(),
    })
}

fn write_object(writer: &mut Writer<Vec<u8>>, obj: &ManagedObject) -> quick_xml::Result<()> {
    let class = obj.qualified_class();
    let dist_name = obj.dist_name.to_string();
    let mut start = BytesStart::new(EL_OBJECT);
    start.push_attribute(("class", class.as_str()));
    start.push_attribute(("distName", dist_name.as_str()));
    start.push_attribute(("version", obj.version.as_str()));
    if let Some(op) = obj.operation {
        start.push_attribute(("operation", op.as_str()));
    }

    if obj.parameters.is_empty() && obj.lists.is_empty() {
        return writer.write_event(Event::Empty(start));
    }
    writer.write_event(Event::Start(start))?;

    for (name, value) in &obj.parameters {
        write_param(writer, Some(name), value)?;
    }
    for (name, list) in &obj.lists {
        let mut start = BytesStart::new(EL_LIST);
        start.push_attribute(("name", name.as_str()));
        if list.is_empty() {
            writer.write_event(Event::Empty(start))?;
            continue;
        }
        writer.write_event(Event::Start(start))?;
        match list {
            ListValue::Scalar(values) => {
                for value in values {
                    write_param(writer, None, value)?;
                }
            }
            ListValue::Records(records) => {
                for record in records {
                    if record.is_empty() {
                        writer.write_event(Event::Empty(BytesStart::new(EL_ITEM)))?;
                        continue;
                    }
                    writer.write_event(Event::Start(BytesStart::new(EL_ITEM)))?;
                    for (field, value) in record {
                        write_param(writer, Some(field), value)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new(EL_ITEM)))?;
                }
            }
        }
        writer.write_event(Event::End(BytesEnd::new(EL_LIST)))?;
    }

    writer.write_event(Event::End(BytesEnd::new(EL_OBJECT)))
}

fn write_param(
    writer: &mut Writer<Vec<u8>>,
    name: Option<&str>,
    value: &str,
) -> quick_xml::Result<()> {
    let mut start = BytesStart::new(EL_PARAM);
    if let Some(name) = name {
        start.push_attribute(("name", name));
    }
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(EL_PARAM)))
}

/// Read the objects of a document in document order
///
/// # Errors
///
/// `Document` for malformed XML or misplaced elements; `InvalidDistName`
/// for unparseable `distName` attributes.
pub fn parse_document(text: &str) -> Result<Vec<ManagedObject>> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    let mut state = ParseState::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => state.open(&e)?,
            Event::Empty(e) => {
                state.open(&e)?;
                state.close(e.local_name().as_ref())?;
            }
            Event::Text(t) => state.text(&t.unescape()?),
            Event::CData(c) => state.text(&String::from_utf8_lossy(&c.into_inner())),
            Event::End(e) => state.close(e.local_name().as_ref())?,
            Event::Eof => break,
            _ => {}
        }
    }
    state.finish()
}

fn misplaced(element: &str) -> CmError {
    CmError::Document {
        reason: format!("misplaced <{}> element", element),
    }
}

fn missing_attribute(element: &str, attribute: &str) -> CmError {
    CmError::Document {
        reason: format!("<{}> without {} attribute", element, attribute),
    }
}

fn attributes(e: &BytesStart) -> Result<IndexMap<String, String>> {
    let mut out = IndexMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        out.insert(key, attr.unescape_value()?.into_owned());
    }
    Ok(out)
}

#[derive(Default)]
struct ParseState {
    objects: Vec<ManagedObject>,
    object: Option<ManagedObject>,
    /// List being read; its shape is fixed by the first child element
    list: Option<(String, Option<ListValue>)>,
    record: Option<Record>,
    param: Option<(Option<String>, String)>,
}

impl ParseState {
    fn open(&mut self, e: &BytesStart) -> Result<()> {
        match e.local_name().as_ref() {
            b"managedObject" => {
                if self.object.is_some() {
                    return Err(misplaced(EL_OBJECT));
                }
                self.object = Some(object_from_attributes(attributes(e)?)?);
            }
            b"list" => {
                if self.object.is_none() || self.list.is_some() {
                    return Err(misplaced(EL_LIST));
                }
                let name = attributes(e)?
                    .shift_remove("name")
                    .ok_or_else(|| missing_attribute(EL_LIST, "name"))?;
                self.list = Some((name, None));
            }
            b"item" => {
                let Some((_, shape)) = self.list.as_mut() else {
                    return Err(misplaced(EL_ITEM));
                };
                match shape {
                    None => *shape = Some(ListValue::Records(Vec::new())),
                    Some(ListValue::Records(_)) => {}
                    Some(ListValue::Scalar(_)) => return Err(misplaced(EL_ITEM)),
                }
                self.record = Some(Record::new());
            }
            b"p" => {
                if self.object.is_none() || self.param.is_some() {
                    return Err(misplaced(EL_PARAM));
                }
                let name = attributes(e)?.shift_remove("name");
                self.param = Some((name, String::new()));
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some((_, buf)) = self.param.as_mut() {
            buf.push_str(text);
        }
    }

    fn close(&mut self, name: &[u8]) -> Result<()> {
        match name {
            b"p" => {
                let Some((name, value)) = self.param.take() else {
                    return Err(misplaced(EL_PARAM));
                };
                self.finish_param(name, value)?;
            }
            b"item" => {
                let record = self.record.take().ok_or_else(|| misplaced(EL_ITEM))?;
                if let Some((_, Some(ListValue::Records(records)))) = self.list.as_mut() {
                    records.push(record);
                }
            }
            b"list" => {
                let (name, shape) = self.list.take().ok_or_else(|| misplaced(EL_LIST))?;
                let obj = self.object.as_mut().ok_or_else(|| misplaced(EL_LIST))?;
                obj.lists
                    .insert(name, shape.unwrap_or(ListValue::Scalar(Vec::new())));
            }
            b"managedObject" => {
                let obj = self.object.take().ok_or_else(|| misplaced(EL_OBJECT))?;
                self.objects.push(obj);
            }
            _ => {}
        }
        Ok(())
    }

    fn finish_param(&mut self, name: Option<String>, value: String) -> Result<()> {
        if let Some(record) = self.record.as_mut() {
            let name = name.ok_or_else(|| missing_attribute(EL_PARAM, "name"))?;
            record.insert(name, value);
            return Ok(());
        }
        if let Some((_, shape)) = self.list.as_mut() {
            match shape.get_or_insert_with(|| ListValue::Scalar(Vec::new())) {
                ListValue::Scalar(values) => values.push(value),
                ListValue::Records(_) => return Err(misplaced(EL_PARAM)),
            }
            return Ok(());
        }
        let obj = self.object.as_mut().ok_or_else(|| misplaced(EL_PARAM))?;
        let name = name.ok_or_else(|| missing_attribute(EL_PARAM, "name"))?;
        obj.set_parameter(name, value);
        Ok(())
    }

    fn finish(self) -> Result<Vec<ManagedObject>> {
        if self.object.is_some() {
            return Err(CmError::Document {
                reason: format!("unterminated <{}> element", EL_OBJECT),
            });
        }
        Ok(self.objects)
    }
}

fn object_from_attributes(mut attrs: IndexMap<String, String>) -> Result<ManagedObject> {
    let qualified = attrs
        .shift_remove("class")
        .ok_or_else(|| missing_attribute(EL_OBJECT, "class"))?;
    let dist_name = attrs
        .shift_remove("distName")
        .ok_or_else(|| missing_attribute(EL_OBJECT, "distName"))?;
    let dist_name = DistName::parse(&dist_name)?;
    let version = attrs.shift_remove("version").unwrap_or_default();

    let (namespace, class) = match qualified.split_once(':') {
        Some((ns, class)) => (Some(ns.to_string()), class.to_string()),
        None => (None, qualified),
    };
    let mut obj = ManagedObject::new(class, namespace, dist_name, version);

    if let Some(op) = attrs.shift_remove("operation") {
        let tag = OperationTag::parse(&op).ok_or_else(|| CmError::Document {
            reason: format!("unknown operation '{}'", op),
        })?;
        obj.operation = Some(tag);
    }
    Ok(obj)
}
