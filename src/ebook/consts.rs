// General
pub(crate) const ID: &str = "id";
pub(crate) const HREF: &str = "href";

// Paths
pub(crate) const CONTAINER: &str = "META-INF/container.xml"; // Used to identify container

pub(crate) mod opf {
    // Elements
    pub(crate) const ROOT_FILE: &str = "rootfile";
    pub(crate) const PACKAGE: &str = "package";
    pub(crate) const MANIFEST: &str = "manifest";
    pub(crate) const ITEM: &str = "item";
    pub(crate) const SPINE: &str = "spine";
    pub(crate) const ITEMREF: &str = "itemref";

    // Container attributes
    pub(crate) const FULL_PATH: &str = "full-path";

    // Manifest attributes
    pub(crate) const MEDIA_TYPE: &str = "media-type";
    pub(crate) const PROPERTIES: &str = "properties";

    // Manifest item properties
    pub(crate) const NAV_PROPERTY: &str = "nav";

    // Spine attributes
    pub(crate) const IDREF: &str = "idref";
    pub(crate) const LINEAR: &str = "linear";
    pub(crate) const TOC: &str = "toc";
    pub(crate) const NO: &str = "no";

    // Media types
    pub(crate) const XHTML_TYPE: &str = "application/xhtml+xml";
    pub(crate) const HTML_TYPE: &str = "text/html";
    pub(crate) const NCX_TYPE: &str = "application/x-dtbncx+xml";
    pub(crate) const PAGE_MAP_TYPE: &str = "application/oebps-page-map+xml";

    // Adobe page map
    pub(crate) const PAGE_MAP: &str = "page-map";
    pub(crate) const PAGE_MAP_FILE: &str = "page-map.xml";
    pub(crate) const PAGE_MAP_ID: &str = "map";
    pub(crate) const OPF_NS: &str = "http://www.idpf.org/2007/opf";
}

pub(crate) mod ncx {
    // Elements
    pub(crate) const NAV_MAP: &str = "navMap";
    pub(crate) const NAV_POINT: &str = "navPoint";
    pub(crate) const NAV_LABEL: &str = "navLabel";
    pub(crate) const TEXT: &str = "text";
    pub(crate) const CONTENT: &str = "content";
    pub(crate) const PAGE_LIST: &str = "pageList";
    pub(crate) const PAGE_TARGET: &str = "pageTarget";

    // Attributes
    pub(crate) const SRC: &str = "src";
    pub(crate) const TYPE: &str = "type";
    pub(crate) const VALUE: &str = "value";

    // Attribute values
    pub(crate) const NORMAL: &str = "normal";
}

pub(crate) mod nav {
    // Elements
    pub(crate) const NAV: &str = "nav";
    pub(crate) const BODY: &str = "body";
    pub(crate) const HTML: &str = "html";
    pub(crate) const SPAN: &str = "span";
    pub(crate) const OL: &str = "ol";
    pub(crate) const LI: &str = "li";
    pub(crate) const ANCHOR: &str = "a";
    pub(crate) const HEADER: &str = "h1";

    // Attributes
    pub(crate) const EPUB_TYPE: &str = "epub:type";
    pub(crate) const HIDDEN: &str = "hidden";
    pub(crate) const VALUE: &str = "value";

    // `epub:type` values
    pub(crate) const TOC: &str = "toc";
    pub(crate) const PAGE_LIST: &str = "page-list";
    pub(crate) const PAGE_BREAK: &str = "pagebreak";
}
