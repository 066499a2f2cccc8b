//! End-to-end integration tests for filekit.
//!
//! Filesystem, image and reading-list tests run everywhere. PDF tests need a
//! pdfium shared library and skip themselves when none can be bound. The
//! DOCX test only checks the missing-pandoc path.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium cargo test --test e2e -- --nocapture

use filekit::config::PageSelection;
use filekit::imaging::{ResizeDownload, ResizeMode};
use filekit::library::{BookFilter, Library, ReadingStatus, StatusUpdate};
use filekit::pdf::{self, engine};
use filekit::{
    list_files, render_tree, Book, BatchProgressCallback, DocxConfig, FilekitError, PdfInput,
    RasterConfig, RasterFormat, RasterOutput, TreeOptions,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use pdfium_render::prelude::*;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// pdfium tears the library down when an instance is dropped, so PDF tests
/// run one at a time.
static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

/// Skip this test if pdfium cannot be bound; otherwise hold the PDF lock.
macro_rules! skip_unless_pdfium {
    () => {{
        let guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = engine::bind() {
            let reason = e.to_string();
            println!("SKIP — pdfium not available: {}", reason.lines().next().unwrap_or(""));
            return;
        }
        guard
    }};
}

/// A blank PDF with `pages` A4 pages.
fn blank_pdf(name: &str, pages: usize) -> PdfInput {
    let pdfium = engine::bind().expect("pdfium bound");
    let mut doc = pdfium.create_new_pdf().expect("new document");
    for _ in 0..pages {
        doc.pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .expect("page added");
    }
    PdfInput::new(name, doc.save_to_bytes().expect("saved"))
}

fn page_count(bytes: &[u8]) -> usize {
    let pdfium = engine::bind().expect("pdfium bound");
    let doc = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .expect("valid PDF");
    doc.pages().len() as usize
}

fn zip_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("entry").name().to_string())
        .collect()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([200, 30, 90])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    buf
}

#[derive(Default)]
struct Counter {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl BatchProgressCallback for Counter {
    fn on_item_complete(&self, _index: usize, _total: usize, _name: &str) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_item_error(&self, _index: usize, _total: usize, _error: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Files ────────────────────────────────────────────────────────────────────

#[test]
fn tree_and_listing_on_real_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("src/deep")).unwrap();
    std::fs::write(dir.path().join("Cargo.toml"), "").unwrap();
    std::fs::write(dir.path().join("src/main.rs"), "").unwrap();
    std::fs::write(dir.path().join("src/deep/mod.rs"), "").unwrap();

    let lines = render_tree(dir.path(), &TreeOptions::default()).unwrap();
    assert!(lines[0].starts_with("└── "));
    assert!(lines.iter().any(|l| l.ends_with("src/")));
    assert!(lines.iter().any(|l| l.ends_with("mod.rs")));

    let shallow = TreeOptions {
        max_depth: 1,
        ..TreeOptions::default()
    };
    let lines = render_tree(dir.path(), &shallow).unwrap();
    assert!(!lines.iter().any(|l| l.ends_with("main.rs")));

    let listing = list_files(dir.path()).unwrap();
    assert_eq!(listing.files, vec!["Cargo.toml"]);
    assert!(listing.report().contains("Cargo.toml"));
}

#[test]
fn tree_rejects_files_and_missing_paths() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.txt");
    std::fs::write(&file, "x").unwrap();

    assert!(matches!(
        render_tree(&file, &TreeOptions::default()),
        Err(FilekitError::NotADirectory { .. })
    ));
    assert!(matches!(
        list_files(dir.path().join("nope")),
        Err(FilekitError::PathNotFound { .. })
    ));
}

#[cfg(unix)]
#[test]
fn tree_marks_unreadable_directories() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let locked = dir.path().join("locked");
    std::fs::create_dir(&locked).unwrap();
    std::fs::write(dir.path().join("visible.txt"), "").unwrap();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    if std::fs::read_dir(&locked).is_ok() {
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        println!("SKIP — running with privileges that ignore directory permissions");
        return;
    }

    let lines = render_tree(dir.path(), &TreeOptions::default());
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    let lines = lines.unwrap();

    assert!(lines.iter().any(|l| l.ends_with("locked/")));
    assert!(lines.iter().any(|l| l.ends_with("⛔ [Access denied]")));
    assert!(lines.iter().any(|l| l.ends_with("visible.txt")));
}

// ── Images ───────────────────────────────────────────────────────────────────

#[test]
fn batch_resize_continues_past_bad_files() {
    let counter = Arc::new(Counter::default());
    let inputs = vec![
        ("a.png".to_string(), png(100, 50)),
        ("broken.jpg".to_string(), b"definitely not a jpeg".to_vec()),
        ("b.png".to_string(), png(40, 40)),
    ];

    let batch = filekit::resize_batch(inputs, ResizeMode::Percent(50), Some(counter.clone()));
    assert_eq!(batch.images.len(), 2);
    assert_eq!(batch.errors.len(), 1);
    assert_eq!(batch.errors[0].name(), "broken.jpg");
    assert_eq!(counter.completed.load(Ordering::SeqCst), 2);
    assert_eq!(counter.failed.load(Ordering::SeqCst), 1);
    assert_eq!(batch.images[0].dimensions_label(), "50x25");

    match batch.into_archive().unwrap() {
        Some(ResizeDownload::Archive { name, bytes }) => {
            assert_eq!(name, "resized_images.zip");
            assert_eq!(zip_names(&bytes), vec!["a.png", "b.png"]);
        }
        other => panic!("expected an archive, got {other:?}"),
    }
}

#[test]
fn single_resize_keeps_format_and_aspect() {
    let img = filekit::resize_image("wide.png", &png(300, 100), ResizeMode::Width(150)).unwrap();
    assert_eq!((img.width, img.height), (150, 50));
    assert_eq!(image::guess_format(&img.bytes).unwrap(), ImageFormat::Png);
}

// ── Reading list ─────────────────────────────────────────────────────────────

const READING_LIST: &str = "\
Título,Autor,Ano,Tipo,Prioridade,Status,Disponivel,Categoria,#,Editora
Clean Code,Robert C. Martin,2008,Técnico,4 - Alta,0,Estante,Artesanato de Software (Clean Code),,Alta Books
Dune,Frank Herbert,1965,Não Técnico,2 - Média,1,Kindle,Épicos & Ficção Reflexiva,2,Aleph
SICP,Abelson,1985,Técnico,3 - Média-Alta,1,Estante,Fundamentos de Computação,1,MIT
";

#[test]
fn reading_list_crud_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("books.csv");
    std::fs::write(&path, READING_LIST).unwrap();

    let mut library = Library::load(&path).unwrap();
    assert_eq!(library.len(), 3);

    library
        .add_book(Book {
            title: "Refactoring".into(),
            author: "Martin Fowler".into(),
            year: Some(1999),
            kind: "Técnico".into(),
            priority: "3 - Média-Alta".into(),
            availability: "Estante".into(),
            category: "Artesanato de Software (Clean Code)".into(),
            ..Book::default()
        })
        .unwrap();
    library
        .update_status(
            "Dune",
            StatusUpdate {
                status: ReadingStatus::Read,
                rating: Some(5),
                read_date: Some("2024/3".into()),
                availability: None,
            },
        )
        .unwrap();
    assert_eq!(library.delete_book("SICP").unwrap(), 1);
    library.save().unwrap();

    let reloaded = Library::load(&path).unwrap();
    assert_eq!(reloaded.len(), 3);
    let dune = reloaded.find("Dune").unwrap();
    assert_eq!(dune.status, ReadingStatus::Read);
    assert_eq!(dune.rating, Some(5));
    assert_eq!(dune.read_date.as_deref(), Some("2024/03"));
    assert!(reloaded.find("SICP").is_none());
    assert!(reloaded.find("Refactoring").unwrap().score > 0);

    let mut raw = String::new();
    std::fs::File::open(&path)
        .unwrap()
        .read_to_string(&mut raw)
        .unwrap();
    let header = raw.lines().next().unwrap();
    assert!(header.contains("Editora"));
    assert!(header.contains("Nota"));
    assert!(raw.contains("Alta Books"));
}

#[test]
fn reading_list_rejects_duplicates_and_unknown_titles() {
    let mut library = Library::from_reader(READING_LIST.as_bytes()).unwrap();
    let dup = library.add_book(Book {
        title: "  clean code ".into(),
        author: "Someone".into(),
        ..Book::default()
    });
    assert!(matches!(dup, Err(FilekitError::DuplicateBook { .. })));
    assert!(matches!(
        library.delete_book("Missing"),
        Err(FilekitError::BookNotFound { .. })
    ));
}

#[test]
fn reading_queue_follows_planned_order() {
    let library = Library::from_reader(READING_LIST.as_bytes()).unwrap();
    let filter = BookFilter {
        statuses: vec![ReadingStatus::ToRead],
        ..BookFilter::default()
    };
    let titles: Vec<&str> = filter
        .apply(library.books())
        .iter()
        .map(|b| b.title.as_str())
        .collect();
    assert_eq!(titles, vec!["SICP", "Dune"]);
}

#[test]
fn missing_columns_are_reported() {
    let err = Library::from_reader("Título,Autor\nDune,Herbert\n".as_bytes()).unwrap_err();
    match err {
        FilekitError::MissingColumns { missing, .. } => assert!(missing.contains(&"Status".to_string())),
        other => panic!("expected MissingColumns, got {other:?}"),
    }
}

// ── Documents ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn docx_conversion_reports_missing_pandoc() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("note.docx");
    std::fs::write(&input, b"PK").unwrap();

    let config = DocxConfig {
        pandoc_binary: "/nonexistent/pandoc-binary".into(),
        ..DocxConfig::default()
    };
    let err = filekit::document::docx_to_markdown(&input, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, FilekitError::PandocNotFound { .. }));
}

// ── PDF ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn merge_concatenates_in_order() {
    let _pdfium = skip_unless_pdfium!();
    let inputs = vec![blank_pdf("a.pdf", 1), blank_pdf("b.pdf", 2), blank_pdf("c.pdf", 1)];
    let merged = pdf::merge_pdfs(inputs).await.unwrap();
    assert_eq!(page_count(&merged), 4);
}

#[tokio::test]
async fn merge_of_nothing_is_invalid() {
    let _pdfium = skip_unless_pdfium!();
    let err = pdf::merge_pdfs(Vec::new()).await.unwrap_err();
    assert!(matches!(err, FilekitError::InvalidInput(_)));
}

#[tokio::test]
async fn extract_selected_pages() {
    let _pdfium = skip_unless_pdfium!();
    let input = blank_pdf("report.pdf", 10);
    let selection: PageSelection = "1, 3-5, 8, 42".parse().unwrap();
    let out = pdf::extract_pages(input, selection).await.unwrap();
    assert_eq!(page_count(&out), 5);
}

#[tokio::test]
async fn extract_out_of_range_selects_nothing() {
    let _pdfium = skip_unless_pdfium!();
    let input = blank_pdf("short.pdf", 2);
    let selection: PageSelection = "5-9".parse().unwrap();
    let err = pdf::extract_pages(input, selection).await.unwrap_err();
    assert!(matches!(err, FilekitError::NoPagesSelected { total: 2 }));
}

#[tokio::test]
async fn split_yields_numbered_single_pages() {
    let _pdfium = skip_unless_pdfium!();
    let input = blank_pdf("book.pdf", 3);
    let zip = pdf::split_pdf(input, "book".into()).await.unwrap();
    assert_eq!(
        zip_names(&zip),
        vec!["book_001.pdf", "book_002.pdf", "book_003.pdf"]
    );
}

#[tokio::test]
async fn rasterise_single_page_and_archive() {
    let _pdfium = skip_unless_pdfium!();
    let config = RasterConfig::builder().dpi(72).build().unwrap();
    let single = pdf::pdf_to_images(blank_pdf("one.pdf", 1), config)
        .await
        .unwrap();
    match single {
        RasterOutput::Single { ref bytes, format } => {
            assert_eq!(format, RasterFormat::Png);
            assert_eq!(image::guess_format(bytes).unwrap(), ImageFormat::Png);
        }
        ref other => panic!("expected a single image, got {} pages", other.page_count()),
    }
    assert_eq!(single.file_name("one"), "one.png");

    let counter = Arc::new(Counter::default());
    let config = RasterConfig::builder()
        .dpi(72)
        .format(RasterFormat::Jpeg)
        .progress_callback(counter.clone())
        .build()
        .unwrap();
    let many = pdf::pdf_to_images(blank_pdf("three.pdf", 3), config)
        .await
        .unwrap();
    assert_eq!(many.page_count(), 3);
    assert_eq!(
        zip_names(many.bytes()),
        vec!["page_001.jpg", "page_002.jpg", "page_003.jpg"]
    );
    assert_eq!(counter.completed.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn rasterise_scales_by_dpi() {
    let _pdfium = skip_unless_pdfium!();
    let config = RasterConfig::builder().dpi(144).build().unwrap();
    let out = pdf::pdf_to_images(blank_pdf("a4.pdf", 1), config)
        .await
        .unwrap();
    let img = image::load_from_memory(out.bytes()).unwrap();

    // A4 is 595.3 x 841.9 pt, so 144 DPI doubles it.
    assert!((1190..=1191).contains(&img.width()), "width {}", img.width());
    assert!((1683..=1684).contains(&img.height()), "height {}", img.height());
}

/// One blank page, RC4-encrypted with the user password `secret`.
const ENCRYPTED_PDF: &[u8] = include_bytes!("fixtures/encrypted.pdf");

#[tokio::test]
async fn encrypted_pdf_needs_the_right_password() {
    let _pdfium = skip_unless_pdfium!();

    let err = pdf::inspect(PdfInput::new("locked.pdf", ENCRYPTED_PDF.to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, FilekitError::PasswordRequired { .. }), "{err:?}");

    let wrong = PdfInput::new("locked.pdf", ENCRYPTED_PDF.to_vec()).with_password("guess");
    let err = pdf::inspect(wrong).await.unwrap_err();
    assert!(matches!(err, FilekitError::WrongPassword { .. }), "{err:?}");

    let right = PdfInput::new("locked.pdf", ENCRYPTED_PDF.to_vec()).with_password("secret");
    let meta = pdf::inspect(right).await.unwrap();
    assert_eq!(meta.page_count, 1);
}

#[tokio::test]
async fn inspect_reports_page_count() {
    let _pdfium = skip_unless_pdfium!();
    let meta = pdf::inspect(blank_pdf("blank.pdf", 4)).await.unwrap();
    assert_eq!(meta.page_count, 4);
    assert!(!meta.pdf_version.is_empty());
}

#[tokio::test]
async fn non_pdf_bytes_are_rejected() {
    let _pdfium = skip_unless_pdfium!();
    let input = PdfInput::new("notes.txt", b"hello world".to_vec());
    let err = pdf::inspect(input).await.unwrap_err();
    assert!(matches!(err, FilekitError::NotAPdf { .. }));
}
