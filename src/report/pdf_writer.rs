//! 把排版结果序列化为 PDF
//!
//! 只使用标准 Type1 字体，不写入随机 ID 或创建时间，输出只取决于排版结果

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::RenderError;
use crate::report::layout::{FontFace, Layout, Page, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, TITLE};
use crate::report::winansi;

const PT_PER_MM: f32 = 72.0 / 25.4;

fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

pub fn write_pdf(layout: &Layout) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for face in FontFace::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let page_id = add_page(&mut doc, pages_id, page)?;
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                mm_to_pt(PAGE_WIDTH_MM).into(),
                mm_to_pt(PAGE_HEIGHT_MM).into(),
            ],
        }),
    );

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(winansi::encode(TITLE)),
        "Producer" => Object::string_literal("guided_interview"),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RenderError::Serialize(e.to_string()))?;
    Ok(bytes)
}

fn add_page(doc: &mut Document, pages_id: ObjectId, page: &Page) -> Result<ObjectId, RenderError> {
    let content = Content {
        operations: page_operations(page),
    };
    let encoded = content
        .encode()
        .map_err(|e| RenderError::Content(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let page_height_pt = mm_to_pt(PAGE_HEIGHT_MM);
    let mut operations = Vec::with_capacity(page.lines.len() * 5);
    for line in &page.lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![line.face.resource_name().into(), line.size_pt.into()],
        ));
        operations.push(Operation::new(
            "Td",
            vec![
                mm_to_pt(line.x_mm).into(),
                (page_height_pt - mm_to_pt(line.baseline_mm)).into(),
            ],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(winansi::encode(&line.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    operations
}
