//! User-facing texts
//!
//! Static replies use Telegram HTML for emphasis; status texts are plain.

use crate::download::bytes_to_mib;

/// Greeting for `/start`
pub const START_TEXT: &str = "👋 أهلاً! أنا بوت تنزيل الفيديوهات.\n\n\
    📌 <b>المواقع المدعومة:</b>\n\
    • Instagram  🟣\n\
    • Facebook   🔵\n\
    • TikTok     ⚫\n\
    • YouTube    🔴\n\
    • Twitter/X  🐦\n\
    • وأكتر من 1000 موقع!\n\n\
    ✅ <b>الاستخدام:</b> ابعتلي رابط الفيديو مباشرة.";

/// Usage notes for `/help`, mentioning the configured ceiling
#[must_use]
pub fn help_text(max_file_size_mb: u64) -> String {
    format!(
        "🆘 <b>المساعدة</b>\n\n\
         1️⃣ انسخ رابط الفيديو\n\
         2️⃣ ابعته هنا\n\
         3️⃣ استنى شوية وهيتنزل ✅\n\n\
         ⚠️ <b>ملاحظات:</b>\n\
         - الحد الأقصى للحجم {max_file_size_mb}MB\n\
         - بعض الفيديوهات الخاصة مش هتتنزل\n\
         - للإنستجرام الخاص محتاج ملف cookies"
    )
}

/// Reply for text that doesn't look like a link
pub const INVALID_URL_TEXT: &str = "❌ ابعتلي رابط صحيح يبدأ بـ https://";

/// Status shown while yt-dlp is working
pub const DOWNLOADING_TEXT: &str = "⏳ بجيب الفيديو... استنى!";

/// Status shown while the file is uploaded
pub const UPLOADING_TEXT: &str = "📤 بيترفع على تليجرام...";

/// Caption of the delivered video
pub const SUCCESS_CAPTION: &str = "✅ تم التنزيل بنجاح! 🎉";

/// Status after the extractor refused the link
pub const EXTRACTION_FAILED_TEXT: &str = "❌ مش قادر أنزل الفيديو ده.\n\n\
    ممكن يكون:\n\
    • الحساب خاص\n\
    • الرابط غلط\n\
    • المحتوى اتحذف";

/// Status after any other failure
pub const UNEXPECTED_ERROR_TEXT: &str = "⚠️ حصل خطأ غير متوقع، حاول تاني.";

/// Status for a download above the ceiling
#[must_use]
pub fn too_large_text(size_bytes: u64, max_file_size_mb: u64) -> String {
    format!(
        "❌ الفيديو كبير جداً ({:.1}MB).\nالحد المسموح {max_file_size_mb}MB.",
        bytes_to_mib(size_bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_text_reports_both_sizes() {
        let text = too_large_text(80 * 1024 * 1024, 50);
        assert!(text.contains("80.0MB"));
        assert!(text.contains("50MB"));
    }

    #[test]
    fn test_help_text_uses_ceiling() {
        assert!(help_text(20).contains("20MB"));
    }

    #[test]
    fn test_static_texts_keep_line_breaks() {
        assert!(START_TEXT.contains("\n• Instagram"));
        assert!(EXTRACTION_FAILED_TEXT.ends_with("• المحتوى اتحذف"));
    }
}
