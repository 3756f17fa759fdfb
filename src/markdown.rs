use pulldown_cmark::{html, Event, Options, Parser};

fn options() -> Options {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts.insert(Options::ENABLE_FOOTNOTES);
    opts
}

/// Render markdown to HTML with GitHub-flavored extensions.
///
/// Single newlines inside a paragraph become `<br />`. Raw HTML in the
/// source is passed through, so only trusted text belongs here.
pub fn render_markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, options()).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut html_output = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    html_output
}
