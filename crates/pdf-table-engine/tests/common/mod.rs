#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::encryption::{decrypt_object, get_encryption_key};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat, dictionary};

/// Builds a Courier text PDF, one page per entry, one text line per string.
pub fn build_text_pdf(pages: &[Vec<&str>]) -> Result<Document, Box<dyn std::error::Error>> {
    build_pdf_with_font(
        pages,
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        },
    )
}

fn build_pdf_with_font(
    pages: &[Vec<&str>],
    font: Dictionary,
) -> Result<Document, Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(font);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("TL", vec![16.into()]),
            Operation::new("Td", vec![50.into(), 780.into()]),
        ];

        for (index, line) in lines.iter().enumerate() {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            if index + 1 < lines.len() {
                operations.push(Operation::new("T*", vec![]));
            }
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        }));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    Ok(doc)
}

pub fn text_pdf_bytes(pages: &[Vec<&str>]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut doc = build_text_pdf(pages)?;
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

pub fn create_test_pdf(path: &Path, pages: &[Vec<&str>]) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, text_pdf_bytes(pages)?)?;
    Ok(())
}

/// A text PDF whose only font is a Type0 font missing its descendant fonts.
pub fn broken_font_pdf_bytes(pages: &[Vec<&str>]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut doc = build_pdf_with_font(
        pages,
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "Courier",
            "Encoding" => "Identity-H",
        },
    )?;
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

const FILE_ID: &[u8; 16] = b"pdf-table-engine";

fn pad_password(password: &str) -> Vec<u8> {
    let bytes = password.as_bytes();
    let len = bytes.len().min(PASSWORD_PADDING.len());
    [&bytes[..len], &PASSWORD_PADDING[..PASSWORD_PADDING.len() - len]].concat()
}

fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut state = (0..=255).collect::<Vec<u8>>();
    let mut j = 0_u8;
    for i in 0..256 {
        j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
        state.swap(i, usize::from(j));
    }

    let (mut i, mut j) = (0_u8, 0_u8);
    data.iter()
        .map(|byte| {
            i = i.wrapping_add(1);
            j = j.wrapping_add(state[usize::from(i)]);
            state.swap(usize::from(i), usize::from(j));
            let index = state[usize::from(i)].wrapping_add(state[usize::from(j)]);
            byte ^ state[usize::from(index)]
        })
        .collect()
}

/// A text PDF encrypted by the standard security handler (revision 2, 40-bit
/// RC4). An empty `user_password` gives an owner-password-only document.
pub fn rc4_encrypted_pdf_bytes(
    pages: &[Vec<&str>],
    user_password: &str,
    owner_password: &str,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut doc = build_text_pdf(pages)?;

    let owner_digest = md5::compute(pad_password(owner_password));
    let owner_entry = rc4(&owner_digest[..5], &pad_password(user_password));
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "O" => Object::String(owner_entry, StringFormat::Hexadecimal),
        "U" => Object::String(vec![0_u8; 32], StringFormat::Hexadecimal),
        "P" => -44,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.trailer.set(
        "ID",
        vec![
            Object::String(FILE_ID.to_vec(), StringFormat::Hexadecimal),
            Object::String(FILE_ID.to_vec(), StringFormat::Hexadecimal),
        ],
    );

    let key = get_encryption_key(&doc, user_password, false)?;
    doc.get_object_mut(encrypt_id)?.as_dict_mut()?.set(
        "U",
        Object::String(rc4(&key, &PASSWORD_PADDING), StringFormat::Hexadecimal),
    );

    // RC4 is symmetric, so the decryption routine encrypts plaintext objects.
    for (&id, object) in &mut doc.objects {
        if id == encrypt_id {
            continue;
        }
        let Ok(ciphertext) = decrypt_object(&key, id, &*object) else {
            continue;
        };
        match object {
            Object::Stream(stream) => stream.set_content(ciphertext),
            Object::String(content, _) => *content = ciphertext,
            _ => {}
        }
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Opening requires the user password `secret`.
pub fn encrypted_pdf_bytes(pages: &[Vec<&str>]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    rc4_encrypted_pdf_bytes(pages, "secret", "owner")
}

/// Restricted by an owner password only; opens with the empty user password.
pub fn owner_only_pdf_bytes(pages: &[Vec<&str>]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    rc4_encrypted_pdf_bytes(pages, "", "owner")
}
