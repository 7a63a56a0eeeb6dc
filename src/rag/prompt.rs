//! Context block and system prompt for grounded answers.

use super::store::ChunkMatch;

/// Shown to the model when retrieval produced nothing.
pub const NO_CONTEXT_PLACEHOLDER: &str = "(ไม่พบข้อมูลที่เกี่ยวข้องในฐานข้อมูล)";

/// Bulleted list of chunk contents, one per line.
pub fn build_context(chunks: &[ChunkMatch]) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT_PLACEHOLDER.to_string();
    }

    chunks
        .iter()
        .map(|chunk| format!("- {}", chunk.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_system_prompt(context: &str) -> String {
    format!(
        "คุณคือผู้ช่วยอัจฉริยะด้านโรคผิวหนัง
จงตอบคำถามโดยอ้างอิงและใช้ข้อมูลที่ให้มาใน \"ข้อมูลอ้างอิง\" เป็นหลัก
หากผู้ใช้ถามหาวิธีรักษาหรือดูแล ให้สรุปขั้นตอนเป็นข้อๆ ให้เข้าใจง่าย
หากไม่มีข้อมูลที่เกี่ยวข้อง ให้บอกว่าไม่ทราบและแนะนำให้ปรึกษาแพทย์
ห้ามแต่งข้อมูลขึ้นมาเองเด็ดขาด

ข้อมูลอ้างอิง:
{}
",
        context
    )
}
