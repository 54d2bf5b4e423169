//! Page shell shared by the index and channel pages

use html_escape::{encode_single_quoted_attribute, encode_text};

const STYLE: &str = r#"
<style>
body {
	font-family: sans-serif;
}
.msg {
	margin-top: 1em;
}
.msgBody {
	margin-left: 4em;
}
.msgHeader {
	display: flex;
	margin-bottom: 0.5em;
}
.user {
	font-weight: bold;
}
img {
	max-width: 80%;
}
.ts {
	font-style: italic;
	font-size: smaller;
	margin-left: 1em;
}
</style>
"#;

/// `Title -- #channel` on channel pages, the bare title on the index
pub fn page_title(title: &str, channel_name: Option<&str>) -> String {
    match channel_name {
        Some(name) => format!("{title} -- #{name}"),
        None => title.to_string(),
    }
}

pub fn page_header(title: &str, channel_name: Option<&str>) -> String {
    let title = encode_text(&page_title(title, channel_name)).into_owned();
    format!("<html><head>\n{STYLE}<title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n")
}

pub fn page_footer() -> &'static str {
    "</body></html>\n"
}

/// Channel list, one link per channel in the order given
pub fn render_index(title: &str, channel_names: &[&str]) -> String {
    let mut html = page_header(title, None);
    for name in channel_names {
        html.push_str(&format!(
            "<a href='{}.html'>#{}</a><br>\n",
            encode_single_quoted_attribute(name),
            encode_text(name)
        ));
    }
    html.push_str(page_footer());
    html
}

pub fn render_channel_page(title: &str, channel_name: &str, body: &str) -> String {
    let mut html = page_header(title, Some(channel_name));
    html.push_str(body);
    html.push_str(page_footer());
    html
}
