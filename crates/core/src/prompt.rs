//! System prompt assembly.
//!
//! Pure and deterministic: same sources and level always yield byte-identical
//! output, so a session can be replayed. No I/O happens here.

use crate::source::Source;

/// At most this many sources are rendered into the prompt, regardless of how
/// many were extracted. Bounds prompt size and therefore generation cost.
pub const MAX_PROMPT_SOURCES: usize = 7;

/// Build the system prompt for a tutoring session.
///
/// Each of the first [`MAX_PROMPT_SOURCES`] sources is rendered as a labeled
/// section carrying its extracted text verbatim — including the unavailable
/// sentinel when extraction failed. The target audience `level` is embedded
/// verbatim.
pub fn build_system_prompt(sources: &[Source], level: &str) -> String {
    let mut teaching_info = String::new();
    for (index, source) in sources.iter().take(MAX_PROMPT_SOURCES).enumerate() {
        let content = source.full_content.as_deref().unwrap_or_default();
        teaching_info.push_str(&format!("## Webpage #{index}:\n{content}\n\n"));
    }

    format!(
        "You are a professional interactive personal tutor who is an expert at \
explaining topics. Given a topic and the information to teach, educate the \
user about it at a {level} level. Start off by greeting the learner, give \
them a short overview of the topic, and then ask them what they want to \
learn about (as markdown numbers). Be interactive throughout the chat and \
quiz the user occasionally after you teach them material. Do not quiz them \
in the first overview message and keep that first message short.\n\
\n\
Here is the information to teach:\n\
\n\
<teaching_info>\n\
{teaching_info}</teaching_info>\n\
\n\
Here is the audience level to teach at:\n\
\n\
<level>\n\
{level}\n\
</level>\n\
\n\
Please return your answer in markdown. Here is the topic to educate on:\n"
    )
}
