//! Curated starter knowledge base, inserted once into an empty store.

use serde_json::json;

use super::store::{NewChunk, VectorStore};
use crate::core::errors::ApiError;
use crate::embedding::Embedder;

pub const SEED_SOURCE: &str = "initial_seed";

pub const SEED_DOCUMENTS: [&str; 13] = [
    "โรคผื่นภูมิแพ้ผิวหนัง (Atopic Dermatitis) มักมีอาการผิวแห้ง คันมาก และมีผื่นแดงตามข้อพับ",
    "โรคสะเก็ดเงิน (Psoriasis) เป็นโรคอุบัติซ้ำที่มีผื่นหนา ขอบชัด มีสะเก็ดสีเงิน มักพบบริเวณข้อศอกและหัวเข่า",
    "สิว (Acne Vulgaris) เกิดจากการอุดตันของรูขุมขนและความมันบนใบหน้า มีหลายประเภท ได้แก่ สิวอุดตัน สิวอักเสบ สิวไม่มีหัว",
    "สิวอุดตัน (Comedones) แบ่งเป็นสิวหัวดำ (เปิด) และสิวหัวขาว (ปิด) เกิดจากการอุดตันของหลุมขนด้วยไขมันและเซลล์ผิวหนัง",
    "สิวอักเสบ (Inflammatory Acne) มีลักษณะบวมแดง กดเจ็บ แบ่งเป็นสิวตุ่มแดง (Papules) และสิวหัวหนอง (Pustules) เกิดจากแบคทีเรีย C. acnes",
    "สิวฮอร์โมน มักขึ้นบริเวณคาง คอหอย หรือขากรรไกร มักกำเริบในช่วงก่อนหรือระหว่างมีประจำเดือน เกิดจากความไม่สมดุลของฮอร์โมน",
    "สาเหตุของการเกิดสิวหลักๆ ได้แก่ การผลิตน้ำมันมากเกินไป (Sebum), รูขุมขนอุดตัน, แบคทีเรีย, ความเครียด, พักผ่อนไม่เพียงพอ และอาหารบางชนิด",
    "การรักษาสิวเบื้องต้น: ยาทา Benzoyl Peroxide (BP) ช่วยฆ่าเชื้อแบคทีเรียและลดการอักเสบ, ยาทา Salicylic Acid (BHA) ช่วยผลัดเซลล์ผิวและสลายการอุดตัน",
    "การรักษาสิวด้วยกลุ่มอนุพันธ์วิตามินเอ (Retinoids) ช่วยลดการอุดตัน แต่มักทำให้ผิวแห้งและไวต่อแสง จึงควรทาตอนกลางคืนและใช้มอยเจอร์ไรเซอร์",
    "การดูแลผิวเป็นสิว: ควรล้างหน้า 2 ครั้งต่อวันด้วยคลีนเซอร์สูตรอ่อนโยน ไม่ควรสครับหน้า หลีกเลี่ยงการบีบหรือแกะสิวเพื่อป้องกันการเกิดรอยและหลุมสิว",
    "การเลือกใช้สกินแคร์สำหรับผิวเป็นสิว: ควรเลือกที่มีเครื่องหมาย Non-comedogenic (ไม่อุดตัน), Oil-free และเพิ่มส่วนผสมที่ลดการอักเสบ เช่น Niacinamide, Zinc",
    "รอยสิว (รอยดำ/รอยแดง) สามารถดูแลรักษาได้โดยการใช้ผลิตภัณฑ์ลดเลือนจุดด่างดำ เช่น Vitamin C, Arbutin และต้องทาครีมกันแดดทุกวันเพื่อป้องกันรอยเข้มขึ้น",
    "วิธีการดูแลผิวเบื้องต้น: ควรทาครีมกันแดดทุกวัน และใช้มอยเจอร์ไรเซอร์เพื่อรักษาความชุ่มชื้น ทั้งคนที่เป็นสิวและไม่เป็นสิวก็ควรทำ",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded(usize),
    AlreadyPopulated(usize),
}

/// Inserts [`SEED_DOCUMENTS`] when the store holds no rows.
///
/// Two processes starting against the same empty store can both seed; the
/// check is not transactional across the remote backend.
pub async fn seed_if_empty(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
) -> Result<SeedOutcome, ApiError> {
    let count = store.count().await?;
    if count > 0 {
        return Ok(SeedOutcome::AlreadyPopulated(count));
    }

    tracing::info!("Seeding initial knowledge base into {} ...", store.name());
    let texts: Vec<String> = SEED_DOCUMENTS.iter().map(|doc| doc.to_string()).collect();
    let vectors = embedder.embed_documents(&texts).await?;

    let rows = texts
        .into_iter()
        .zip(vectors)
        .enumerate()
        .map(|(index, (content, embedding))| NewChunk {
            content,
            embedding,
            source: SEED_SOURCE.to_string(),
            metadata: json!({ "index": index, "type": "seed" }),
        })
        .collect();

    let written = store.insert_batch(rows).await?;
    Ok(SeedOutcome::Seeded(written))
}
