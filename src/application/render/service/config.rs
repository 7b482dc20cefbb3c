use comrak::options::Options;

pub(crate) fn default_options() -> Options<'static> {
    let mut options = Options::default();
    configure_extensions(&mut options);
    options
}

fn configure_extensions(options: &mut Options<'static>) {
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.tagfilter = false;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;
    ext.description_lists = true;
    ext.front_matter_delimiter = Some("---".to_string());

    options.parse.smart = true;

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.full_info_string = true;
    render.r#unsafe = true;
    render.sourcepos = false;
}
