//! User-facing reply texts

pub const WELCOME: &str = "\
📸 Image Sharing Bot

How it works:
1. Send /getlink to create a unique sharing session
2. Send me an image
3. Get a public link to view your shared image
4. Anyone with the link can see your image

Commands:
/start - Show this help message
/getlink - Generate a new sharing session";

pub const NEEDS_SESSION: &str =
    "⚠️ Please send /getlink first to create a sharing session, then send your image.";

pub const IMAGE_FAILED: &str = "❌ Error processing image. Please try again.";

pub const HINT: &str = "📸 Send me an image after /getlink, or use /start for instructions.";

pub fn link_issued(session_id: &str, url: &str) -> String {
    format!(
        "🆕 New sharing session created!\n\n\
         🔑 Session ID: {session_id}\n\
         🔗 Public URL: {url}\n\n\
         📤 Now send me an image to share publicly!\n\n\
         ⚠️ Anyone with this link can view your image."
    )
}

pub fn image_shared(url: &str) -> String {
    format!(
        "✅ Image shared successfully!\n\n\
         🔗 Share this link: {url}\n\n\
         🆕 Want to share another image? Send /getlink for a new session!"
    )
}

pub const SESSION_FAILED: &str = "❌ Could not create a sharing session. Please try again.";
