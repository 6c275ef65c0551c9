//! # Converter Module
//!
//! Bulk image conversion on the bounded worker pool.
//!
//! Each file goes through the same steps on a worker:
//! stat → read → decode → encode → write (or base64) → record stats → progress.
//!
//! Results come back in input order. The first failing file aborts the batch
//! and is reported with its index. Files already written stay on disk.
//!
//! ## Example
//! ```rust,ignore
//! use altesse_tools::core::converter::{BatchConverter, ConvertOptions, OutputFormat};
//!
//! let converter = BatchConverter::new(PoolConfig::default())?;
//! let written = converter.convert_to_folder(&paths, "out", &ConvertOptions::new(OutputFormat::WebP))?;
//! ```

mod codec;
mod options;

pub use codec::{Codec, ImageCodec};
pub use options::{ConvertOptions, OutputFormat, DEFAULT_PNG_LEVEL, DEFAULT_QUALITY};

use crate::core::parallel::{CancellationToken, PoolConfig, WorkerPool};
use crate::error::{ConvertError, PoolError, StatsError};
use crate::events::{null_sender, ConvertEvent, ConvertProgress, Event, EventSender};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Receives one call per converted file.
///
/// Failures are logged by the converter and never abort a batch.
pub trait ConversionRecorder: Send + Sync {
    fn record_conversion(
        &self,
        format: &str,
        original_size: u64,
        final_size: u64,
    ) -> Result<(), StatsError>;
}

/// Converts batches of images on a fixed-size pool.
pub struct BatchConverter {
    pool: WorkerPool,
    codec: Box<dyn Codec>,
    recorder: Option<Arc<dyn ConversionRecorder>>,
}

/// One converted file before it is written out
struct Encoded {
    bytes: Vec<u8>,
    original_size: u64,
}

impl BatchConverter {
    /// Converter using [`ImageCodec`] and no stats recording
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        Ok(Self {
            pool: WorkerPool::new(config)?,
            codec: Box::new(ImageCodec::new()),
            recorder: None,
        })
    }

    pub fn with_codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn ConversionRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Convert every file into `out_dir` as `<stem>_converted.<ext>`.
    ///
    /// Inputs sharing a stem get numbered names, see [`output_paths`].
    /// Returns the written paths in input order.
    pub fn convert_to_folder<P: AsRef<Path> + Sync>(
        &self,
        paths: &[P],
        out_dir: impl AsRef<Path>,
        options: &ConvertOptions,
    ) -> Result<Vec<PathBuf>, ConvertError> {
        self.convert_to_folder_with_events(paths, out_dir, options, &null_sender())
    }

    pub fn convert_to_folder_with_events<P: AsRef<Path> + Sync>(
        &self,
        paths: &[P],
        out_dir: impl AsRef<Path>,
        options: &ConvertOptions,
        events: &EventSender,
    ) -> Result<Vec<PathBuf>, ConvertError> {
        self.convert_to_folder_with_cancel(
            paths,
            out_dir,
            options,
            events,
            &CancellationToken::new(),
        )
    }

    pub fn convert_to_folder_with_cancel<P: AsRef<Path> + Sync>(
        &self,
        paths: &[P],
        out_dir: impl AsRef<Path>,
        options: &ConvertOptions,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>, ConvertError> {
        let out_dir = out_dir.as_ref();
        fs::create_dir_all(out_dir).map_err(|source| ConvertError::OutputDirectory {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let outputs = output_paths(out_dir, paths, options.format);

        self.run(paths, options, events, cancel, |index, _, encoded| {
            let output = &outputs[index];
            fs::write(output, &encoded.bytes).map_err(|source| ConvertError::Write {
                path: output.clone(),
                source,
            })?;
            Ok((output.clone(), Some(output.clone())))
        })
    }

    /// Convert every file and return standard base64 of the encoded bytes,
    /// in input order. Nothing is written to disk.
    pub fn convert_to_base64<P: AsRef<Path> + Sync>(
        &self,
        paths: &[P],
        options: &ConvertOptions,
    ) -> Result<Vec<String>, ConvertError> {
        self.convert_to_base64_with_events(paths, options, &null_sender())
    }

    pub fn convert_to_base64_with_events<P: AsRef<Path> + Sync>(
        &self,
        paths: &[P],
        options: &ConvertOptions,
        events: &EventSender,
    ) -> Result<Vec<String>, ConvertError> {
        self.run(
            paths,
            options,
            events,
            &CancellationToken::new(),
            |_, _, encoded| Ok((STANDARD.encode(&encoded.bytes), None)),
        )
    }

    fn run<P, R, F>(
        &self,
        paths: &[P],
        options: &ConvertOptions,
        events: &EventSender,
        cancel: &CancellationToken,
        finish: F,
    ) -> Result<Vec<R>, ConvertError>
    where
        P: AsRef<Path> + Sync,
        R: Send,
        F: Fn(usize, &Path, Encoded) -> Result<(R, Option<PathBuf>), ConvertError> + Sync,
    {
        let total = paths.len();
        let start = Instant::now();
        let completed = AtomicUsize::new(0);

        info!(
            files = total,
            format = %options.format,
            workers = self.pool.worker_count(),
            "conversion started"
        );
        events.send(Event::Convert(ConvertEvent::Started {
            total,
            format: options.format.to_string(),
        }));

        let results = self.pool.map_with_cancel(paths, cancel, |index, path| {
            let path = path.as_ref();
            let encoded = self.encode_file(path, options)?;
            let final_size = encoded.bytes.len() as u64;
            self.record(options.format, encoded.original_size, final_size);

            let (result, output) = finish(index, path, encoded)?;

            let current = completed.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(index, current, path = %path.display(), "converted");
            events.send(Event::Convert(ConvertEvent::Progress(ConvertProgress {
                current,
                total,
                path: path.to_path_buf(),
                output,
            })));

            Ok(result)
        });

        match results {
            Ok(results) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                info!(files = total, duration_ms, "conversion complete");
                events.send(Event::Convert(ConvertEvent::Completed { total, duration_ms }));
                Ok(results)
            }
            Err(error) => {
                let error = ConvertError::from(error);
                warn!(%error, "conversion aborted");
                Err(error)
            }
        }
    }

    fn encode_file(&self, path: &Path, options: &ConvertOptions) -> Result<Encoded, ConvertError> {
        let open_error = |source| ConvertError::Open {
            path: path.to_path_buf(),
            source,
        };

        let original_size = fs::metadata(path).map_err(open_error)?.len();
        let data = fs::read(path).map_err(open_error)?;
        let image = image::load_from_memory(&data).map_err(|source| ConvertError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let bytes = self.codec.encode(&image, options)?;
        Ok(Encoded {
            bytes,
            original_size,
        })
    }

    fn record(&self, format: OutputFormat, original_size: u64, final_size: u64) {
        if let Some(recorder) = &self.recorder {
            if let Err(error) = recorder.record_conversion(format.name(), original_size, final_size)
            {
                warn!(%error, "failed to record conversion statistics");
            }
        }
    }
}

/// `<out_dir>/<stem>_converted.<ext>`
pub fn output_path(out_dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    out_dir.join(format!("{}_converted.{}", file_stem(input), format.extension()))
}

/// One distinct output path per input, in input order.
///
/// The first input with a given stem gets [`output_path`]. Later inputs with
/// the same stem (compared case-insensitively) get `<stem>_converted_<n>.<ext>`
/// with the smallest free `n`.
pub fn output_paths<P: AsRef<Path>>(
    out_dir: &Path,
    inputs: &[P],
    format: OutputFormat,
) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let stem = file_stem(input.as_ref());
            let mut name = format!("{}_converted.{}", stem, format.extension());
            let mut n = 1;
            while !taken.insert(name.to_lowercase()) {
                name = format!("{}_converted_{}.{}", stem, n, format.extension());
                n += 1;
            }
            out_dir.join(name)
        })
        .collect()
}

/// The file's bytes as a `data:<mime>;base64,...` URL, for previews.
///
/// The MIME type comes from the extension. Unknown extensions get
/// `application/octet-stream`. The file is not decoded.
pub fn preview_data_url(path: impl AsRef<Path>) -> Result<String, ConvertError> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|source| ConvertError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mime = image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(data)))
}

fn file_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use image::{Rgb, RgbImage};
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, shade: u8) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(8, 8, Rgb([shade, shade, shade]))
            .save(&path)
            .unwrap();
        path
    }

    fn converter(workers: usize) -> BatchConverter {
        BatchConverter::new(PoolConfig::new(workers).unwrap()).unwrap()
    }

    #[derive(Default)]
    struct MemoryRecorder {
        calls: Mutex<Vec<(String, u64, u64)>>,
    }

    impl ConversionRecorder for MemoryRecorder {
        fn record_conversion(&self, format: &str, original: u64, final_size: u64) -> Result<(), StatsError> {
            self.calls
                .lock()
                .unwrap()
                .push((format.to_string(), original, final_size));
            Ok(())
        }
    }

    struct FailingRecorder;

    impl ConversionRecorder for FailingRecorder {
        fn record_conversion(&self, _: &str, _: u64, _: u64) -> Result<(), StatsError> {
            Err(StatsError::Write {
                path: PathBuf::from("/readonly/stats.json"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    /// Writes the image width as a single byte
    struct WidthCodec;

    impl Codec for WidthCodec {
        fn encode(&self, image: &image::DynamicImage, _: &ConvertOptions) -> Result<Vec<u8>, ConvertError> {
            Ok(vec![image.width() as u8])
        }
    }

    #[test]
    fn custom_codec_is_used() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_png(temp_dir.path(), "a.png", 0);

        let encoded = converter(1)
            .with_codec(WidthCodec)
            .convert_to_base64(&[input], &ConvertOptions::default())
            .unwrap();

        assert_eq!(STANDARD.decode(&encoded[0]).unwrap(), vec![8]);
    }

    #[test]
    fn output_path_uses_stem_and_extension() {
        let output = output_path(Path::new("/out"), Path::new("/in/photo.png"), OutputFormat::Jpeg);
        assert_eq!(output, PathBuf::from("/out/photo_converted.jpg"));
    }

    #[test]
    fn shared_stems_get_numbered_names() {
        let inputs = ["a/img.png", "b/img.png", "img.jpg", "c/IMG.tif", "other.png"];
        let outputs = output_paths(Path::new("/out"), &inputs, OutputFormat::Png);

        let names: Vec<_> = outputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "img_converted.png",
                "img_converted_1.png",
                "img_converted_2.png",
                "IMG_converted_3.png",
                "other_converted.png",
            ]
        );
    }

    #[test]
    fn same_stem_in_two_folders_writes_two_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut inputs = Vec::new();
        for (folder, size) in [("a", 4), ("b", 9)] {
            let dir = temp_dir.path().join(folder);
            fs::create_dir_all(&dir).unwrap();
            let path = dir.join("img.png");
            RgbImage::new(size, size).save(&path).unwrap();
            inputs.push(path);
        }
        let out_dir = temp_dir.path().join("out");

        let outputs = converter(2)
            .convert_to_folder(&inputs, &out_dir, &ConvertOptions::new(OutputFormat::Png))
            .unwrap();

        assert_ne!(outputs[0], outputs[1]);
        assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 2);
        assert_eq!(image::open(&outputs[0]).unwrap().width(), 4);
        assert_eq!(image::open(&outputs[1]).unwrap().width(), 9);
    }

    #[test]
    fn preview_is_a_data_url() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_png(temp_dir.path(), "a.png", 10);

        let url = preview_data_url(&input).unwrap();

        let encoded = url.strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), fs::read(&input).unwrap());
    }

    #[test]
    fn preview_of_unknown_extension_uses_octet_stream() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.xyz");
        fs::write(&path, b"hi").unwrap();

        assert_eq!(
            preview_data_url(&path).unwrap(),
            "data:application/octet-stream;base64,aGk="
        );
        assert!(matches!(
            preview_data_url(temp_dir.path().join("gone.png")),
            Err(ConvertError::Open { .. })
        ));
    }

    #[test]
    fn converts_to_folder_in_input_order() {
        let temp_dir = TempDir::new().unwrap();
        let inputs: Vec<PathBuf> = (0..6)
            .map(|i| write_png(temp_dir.path(), &format!("img{}.png", i), i * 40))
            .collect();
        let out_dir = temp_dir.path().join("out");

        let outputs = converter(3)
            .convert_to_folder(&inputs, &out_dir, &ConvertOptions::new(OutputFormat::Bmp))
            .unwrap();

        assert_eq!(outputs.len(), inputs.len());
        for (i, output) in outputs.iter().enumerate() {
            assert_eq!(output, &out_dir.join(format!("img{}_converted.bmp", i)));
            assert!(output.exists());
        }
    }

    #[test]
    fn empty_batch_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let outputs = converter(2)
            .convert_to_folder::<PathBuf>(&[], temp_dir.path().join("out"), &ConvertOptions::default())
            .unwrap();
        assert!(outputs.is_empty());
    }

    #[test]
    fn base64_decodes_to_an_image() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_png(temp_dir.path(), "a.png", 200);

        let encoded = converter(1)
            .convert_to_base64(&[input], &ConvertOptions::new(OutputFormat::Png))
            .unwrap();

        let bytes = STANDARD.decode(&encoded[0]).unwrap();
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!(image.width(), 8);
    }

    #[test]
    fn undecodable_file_fails_with_its_index() {
        let temp_dir = TempDir::new().unwrap();
        let good = write_png(temp_dir.path(), "good.png", 10);
        let bad = temp_dir.path().join("bad.png");
        fs::write(&bad, b"not an image").unwrap();

        let error = converter(2)
            .convert_to_base64(&[good, bad.clone()], &ConvertOptions::default())
            .unwrap_err();

        match error {
            ConvertError::Item { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, ConvertError::Decode { ref path, .. } if path == &bad));
            }
            other => panic!("expected item error, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let error = converter(1)
            .convert_to_base64(&[PathBuf::from("/nonexistent/image.png")], &ConvertOptions::default())
            .unwrap_err();

        match error {
            ConvertError::Item { source, .. } => {
                assert!(matches!(*source, ConvertError::Open { .. }))
            }
            other => panic!("expected item error, got {:?}", other),
        }
    }

    #[test]
    fn records_one_conversion_per_file() {
        let temp_dir = TempDir::new().unwrap();
        let inputs: Vec<PathBuf> = (0..3)
            .map(|i| write_png(temp_dir.path(), &format!("p{}.png", i), 50))
            .collect();
        let recorder = Arc::new(MemoryRecorder::default());

        converter(2)
            .with_recorder(recorder.clone())
            .convert_to_base64(&inputs, &ConvertOptions::new(OutputFormat::Png))
            .unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        for (format, original, final_size) in calls.iter() {
            assert_eq!(format, "png");
            assert!(*original > 0);
            assert!(*final_size > 0);
        }
    }

    #[test]
    fn recorder_failure_does_not_abort_batch() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_png(temp_dir.path(), "a.png", 1);

        let result = converter(1)
            .with_recorder(Arc::new(FailingRecorder))
            .convert_to_base64(&[input], &ConvertOptions::default());

        assert_eq!(result.unwrap().len(), 1);
    }

    #[test]
    fn progress_counter_reaches_total() {
        let temp_dir = TempDir::new().unwrap();
        let inputs: Vec<PathBuf> = (0..5)
            .map(|i| write_png(temp_dir.path(), &format!("p{}.png", i), 9))
            .collect();

        let (sender, receiver) = EventChannel::new();
        converter(3)
            .convert_to_base64_with_events(&inputs, &ConvertOptions::default(), &sender)
            .unwrap();
        drop(sender);

        let mut counters: Vec<usize> = receiver
            .iter()
            .filter_map(|event| match event {
                Event::Convert(ConvertEvent::Progress(progress)) => Some(progress.current),
                _ => None,
            })
            .collect();
        counters.sort_unstable();
        assert_eq!(counters, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn uncreatable_output_directory_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let error = converter(1)
            .convert_to_folder::<PathBuf>(&[], blocker.join("out"), &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(error, ConvertError::OutputDirectory { .. }));
    }
}
