/// Pagination integration tests over the sample fixture book.
mod paginate {
    mod util;

    use crate::paginate::util::{fixture_bytes, open_sample};
    use pagemark::paginate::errors::PaginateError;
    use pagemark::paginate::{RomanFrontMatter, TocMapEntry, write_book};
    use pagemark::{
        BreakMode, Outcome, PageMode, Pages, PaginationRequest, Paginator, SpinePlacement,
    };

    fn run(request: PaginationRequest) -> Outcome {
        let epub = open_sample();
        Paginator::new(&epub, request).run().unwrap()
    }

    fn paginated(request: PaginationRequest) -> pagemark::paginate::PaginatedBook {
        match run(request) {
            Outcome::Paginated(book) => book,
            outcome => panic!("expected pagination, got {outcome:?}"),
        }
    }

    #[test]
    fn test_container_model() {
        let epub = open_sample();

        assert_eq!(5, epub.manifest().len());
        assert_eq!(3, epub.spine().len());
        assert!(epub.spine().iter().all(|entry| entry.linear));
        assert_eq!("OEBPS/content.opf", epub.opf_path());
        assert_eq!("OEBPS/toc.ncx", epub.ncx().unwrap().href);
        assert_eq!("OEBPS/nav.xhtml", epub.nav().unwrap().href);

        #[rustfmt::skip]
        let expected_toc = [
            ("One", "OEBPS/c1.xhtml#ch1"),
            ("Two", "OEBPS/c2.xhtml"),
            ("Three", "OEBPS/c3.xhtml#ch3"),
        ];
        let leaves = epub.toc_leaves();
        assert_eq!(expected_toc.len(), leaves.len());
        for (leaf, (title, href)) in leaves.iter().zip(expected_toc) {
            assert_eq!(title, leaf.title);
            assert_eq!(href, leaf.href);
        }
    }

    #[test]
    fn test_document_ordering_excludes_navigation() {
        let epub = open_sample();
        let documents = epub.documents(SpinePlacement::Append, SpinePlacement::Append);

        let names: Vec<&str> = documents.iter().map(|item| item.href.as_str()).collect();
        assert_eq!(
            vec!["OEBPS/c1.xhtml", "OEBPS/c2.xhtml", "OEBPS/c3.xhtml"],
            names
        );
    }

    #[test]
    fn test_plain_pagination() {
        // 300 stripped characters into 6 pages of 50
        let mut request = PaginationRequest::new(Pages::Count(6));
        request.break_mode = BreakMode::Split;
        let book = paginated(request);

        let numbers: Vec<&str> = book
            .records
            .iter()
            .map(|record| record.number.as_str())
            .collect();
        assert_eq!(vec!["1", "2", "3", "4", "5", "6"], numbers);

        // Breaks at document starts link to the file itself
        assert_eq!("OEBPS/c1.xhtml", book.records[0].link);
        assert_eq!("OEBPS/c1.xhtml#pg_break_1", book.records[1].link);
        assert_eq!("OEBPS/c2.xhtml", book.records[2].link);
        assert_eq!("OEBPS/c3.xhtml#pg_break_5", book.records[5].link);

        // Mid-document breaks were injected into all three chapters
        let c1 = String::from_utf8(book.files["OEBPS/c1.xhtml"].clone()).unwrap();
        let marker = format!(
            "{}<span id=\"pg_break_1\" value=\"2\" epub:type=\"pagebreak\"/>{}",
            "a".repeat(50),
            "a".repeat(50),
        );
        assert!(c1.contains(&marker), "unexpected chapter content: {c1}");

        // Navigation artefacts with links relative to their location
        let ncx = String::from_utf8(book.files["OEBPS/toc.ncx"].clone()).unwrap();
        assert!(ncx.contains("<pageList><navLabel><text>Pages</text></navLabel>"));
        assert!(ncx.contains(
            r#"<pageTarget id="pageNav_1" type="normal" value="2"><navLabel><text>2</text></navLabel><content src="c1.xhtml#pg_break_1"/></pageTarget>"#
        ));

        let nav = String::from_utf8(book.files["OEBPS/nav.xhtml"].clone()).unwrap();
        assert!(nav.contains(r#"<nav epub:type="page-list" hidden=""><h1>List of Pages</h1>"#));
        assert!(nav.contains(r#"<li><a href="c1.xhtml#pg_break_1">2</a></li>"#));
    }

    #[test]
    fn test_break_snapping_keeps_page_count() {
        for break_mode in [BreakMode::Next, BreakMode::Prev, BreakMode::Split] {
            let mut request = PaginationRequest::new(Pages::Count(5));
            request.break_mode = break_mode;
            let book = paginated(request);

            assert_eq!(5, book.records.len());
        }
    }

    #[test]
    fn test_toc_anchored_pagination() {
        // Page 1 is anchored past the book opening, so the opening
        // becomes page 0 and the page budget grows by one
        let mut request = PaginationRequest::new(Pages::Count(8));
        request.break_mode = BreakMode::Split;
        request.toc_map = Some(vec![
            TocMapEntry::Ignore,
            TocMapEntry::Arabic(1),
            TocMapEntry::Arabic(5),
        ]);
        let book = paginated(request);

        let numbers: Vec<&str> = book
            .records
            .iter()
            .map(|record| record.number.as_str())
            .collect();
        assert_eq!(
            vec!["0", "1", "2", "3", "4", "5", "6", "7", "8"],
            numbers
        );

        // Anchored pages start exactly at their ToC targets
        assert_eq!("OEBPS/c2.xhtml", book.records[1].link);
        assert_eq!("OEBPS/c3.xhtml", book.records[5].link);
    }

    #[test]
    fn test_roman_front_matter() {
        let mut request = PaginationRequest::new(Pages::Count(8));
        request.break_mode = BreakMode::Split;
        request.roman = RomanFrontMatter::Count(3);
        request.toc_map = Some(vec![
            TocMapEntry::Ignore,
            TocMapEntry::Arabic(1),
            TocMapEntry::Arabic(5),
        ]);
        let book = paginated(request);

        let numbers: Vec<&str> = book
            .records
            .iter()
            .map(|record| record.number.as_str())
            .collect();
        assert_eq!(
            vec!["i", "ii", "iii", "1", "2", "3", "4", "5", "6", "7", "8"],
            numbers
        );

        // Content numbering restarts exactly at the page-1 anchor
        assert_eq!("OEBPS/c2.xhtml", book.records[3].link);
        assert_eq!("OEBPS/c3.xhtml", book.records[7].link);
    }

    #[test]
    fn test_adobe_page_map() {
        let mut request = PaginationRequest::new(Pages::Count(6));
        request.adobe_page_map = true;
        let book = paginated(request);

        let page_map = String::from_utf8(book.files["page-map.xml"].clone()).unwrap();
        assert!(page_map.contains(r#"<page-map xmlns="http://www.idpf.org/2007/opf">"#));
        // Page-map links stay absolute
        assert!(page_map.contains(r#"href="OEBPS/c1.xhtml""#));

        let opf = String::from_utf8(book.files["OEBPS/content.opf"].clone()).unwrap();
        assert!(opf.contains(r#"page-map="map""#));
        assert!(opf.contains(
            r#"<item href="page-map.xml" id="map" media-type="application/oebps-page-map+xml"/>"#
        ));
    }

    #[test]
    fn test_round_trip_of_untouched_documents() {
        // Three pages land exactly on the three document starts:
        // no chapter is modified, only the navigation files are
        let mut request = PaginationRequest::new(Pages::Count(3));
        request.break_mode = BreakMode::Split;
        let book = paginated(request);

        for chapter in ["OEBPS/c1.xhtml", "OEBPS/c2.xhtml", "OEBPS/c3.xhtml"] {
            assert!(!book.files.contains_key(chapter));
        }

        let destination = std::env::temp_dir().join("pagemark_round_trip.epub");
        let epub = open_sample();
        write_book(&epub, &book, &destination).unwrap();

        let written = pagemark::Epub::open(&destination).unwrap();
        for chapter in ["OEBPS/c1.xhtml", "OEBPS/c2.xhtml", "OEBPS/c3.xhtml"] {
            assert_eq!(fixture_bytes(chapter), written.read_bytes(chapter).unwrap());
        }
        assert_eq!(
            b"application/epub+zip".to_vec(),
            written.read_bytes("mimetype").unwrap()
        );
        assert!(
            String::from_utf8(written.read_bytes("OEBPS/toc.ncx").unwrap())
                .unwrap()
                .contains("pageList")
        );

        let _ = std::fs::remove_file(destination);
    }

    #[test]
    fn test_book_stats() {
        let request = PaginationRequest::new(Pages::Stats);
        let Outcome::Stats(stats) = run(request) else {
            panic!("expected stats");
        };

        assert_eq!(300, stats.characters);
        assert_eq!(1, stats.lines);
        assert_eq!(1, stats.words);
    }

    #[test]
    fn test_suggestion() {
        let mut request = PaginationRequest::new(Pages::Auto(50));
        request.suggest = true;
        let Outcome::Suggestion(pages) = run(request) else {
            panic!("expected a suggestion");
        };

        assert_eq!(6, pages);
    }

    #[test]
    fn test_identify_existing_markers() {
        let mut request = PaginationRequest::new(Pages::Identify);
        request.page_selector = Some("p#ch*".to_owned());
        let book = paginated(request);

        let links: Vec<&str> = book
            .records
            .iter()
            .map(|record| record.link.as_str())
            .collect();
        assert_eq!(
            vec![
                "OEBPS/c1.xhtml#ch1",
                "OEBPS/c2.xhtml#ch2",
                "OEBPS/c3.xhtml#ch3",
            ],
            links
        );

        // An EPUB 3 nav is present, so markers gain pagebreak semantics
        let c1 = String::from_utf8(book.files["OEBPS/c1.xhtml"].clone()).unwrap();
        assert!(c1.contains(r#"epub:type="pagebreak""#));
    }

    #[test]
    fn test_errors() {
        let epub = open_sample();

        let request = PaginationRequest::new(Pages::Count(1));
        assert!(matches!(
            Paginator::new(&epub, request).run(),
            Err(PaginateError::InvalidInput(_))
        ));

        // The fixture has no newlines: a single line cannot fill six pages
        let mut request = PaginationRequest::new(Pages::Count(6));
        request.page_mode = PageMode::Lines;
        assert!(matches!(
            Paginator::new(&epub, request).run(),
            Err(PaginateError::NotEnoughLines { .. })
        ));

        let mut request = PaginationRequest::new(Pages::Count(6));
        request.toc_map = Some(vec![TocMapEntry::Arabic(1)]);
        assert!(matches!(
            Paginator::new(&epub, request).run(),
            Err(PaginateError::TocMapMismatch {
                expected: 3,
                provided: 1,
            })
        ));

        let mut request = PaginationRequest::new(Pages::Identify);
        request.page_selector = Some("aside.nothing".to_owned());
        assert!(matches!(
            Paginator::new(&epub, request).run(),
            Err(PaginateError::NoPageMarkers(_))
        ));
    }
}
