//! Eval orchestration.
//!
//! Each eval generates content through the same services the API serves,
//! uploads the graded items as a JSONL dataset, starts an eval run and waits
//! for the verdict. A failing case skips that item rather than aborting the
//! whole eval.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::clients::openai::{
    EvalRun, ImagePayload, OpenAiApi, OpenAiClient, ResultCounts,
};
use crate::errors::AppResult;
use crate::evals::datasets::{
    ImageBlendCase, RemixCase, TestCases, VideoIdentityCase, read_image,
};
use crate::evals::ids::EvalIds;
use crate::media::frames::{
    DEFAULT_FRAME_COUNT, FramePosition, cleanup_frames, extract_frames, extract_single_frame,
    frames_to_data_urls,
};
use crate::services::image::blend::BlendService;
use crate::services::script::ScriptService;
use crate::services::video::generate::VideoService;
use crate::services::video::remix::RemixService;
use crate::timing::{DEFAULT_TOLERANCE, format_validation_result, validate_script};
use crate::utils::common::bytes_to_data_url;
use crate::utils::poll::{
    DEFAULT_POLL_BUDGET, DEFAULT_POLL_INTERVAL, JobStatus, wait_until_terminal,
};

#[derive(Debug, Serialize)]
struct RunSummary {
    timestamp: String,
    elapsed: String,
    summary: BTreeMap<String, Option<ResultCounts>>,
}

pub struct EvalRunner {
    client: Arc<OpenAiClient>,
    blend: BlendService,
    script: ScriptService,
    video: VideoService,
    remix: RemixService,
    datasets_dir: PathBuf,
    results_dir: PathBuf,
}

impl EvalRunner {
    pub fn new(client: Arc<OpenAiClient>, evals_dir: &Path) -> Self {
        let api: Arc<dyn OpenAiApi> = client.clone();
        Self {
            client,
            blend: BlendService::new(api.clone()),
            script: ScriptService::new(api.clone()),
            video: VideoService::new(api.clone()),
            remix: RemixService::new(api),
            datasets_dir: evals_dir.join("datasets"),
            results_dir: evals_dir.join("results"),
        }
    }

    /// Run every eval that has both an id and test cases, then write a
    /// summary file. Individual eval failures are reported, not fatal.
    pub async fn run_all(&self, ids: &EvalIds, cases: &TestCases) -> AppResult<()> {
        std::fs::create_dir_all(&self.results_dir)?;
        let started = Instant::now();
        let mut summary: BTreeMap<String, Option<ResultCounts>> = BTreeMap::new();

        summary.insert(
            "imageQuality".to_string(),
            match &ids.image_quality {
                Some(eval_id) => self
                    .run_image_quality(eval_id, &cases.image_blending)
                    .await
                    .unwrap_or_else(|e| {
                        error!("Image Quality eval failed: {}", e);
                        None
                    }),
                None => None,
            },
        );

        summary.insert(
            "videoIdentity".to_string(),
            match &ids.video_identity {
                Some(eval_id) => self
                    .run_video_identity(eval_id, &cases.video_identity)
                    .await
                    .unwrap_or_else(|e| {
                        error!("Video Identity eval failed: {}", e);
                        None
                    }),
                None => None,
            },
        );

        summary.insert(
            "remixBW".to_string(),
            match &ids.remix_bw {
                Some(eval_id) => self
                    .run_remix_bw(eval_id, &cases.remix)
                    .await
                    .unwrap_or_else(|e| {
                        error!("Remix B&W eval failed: {}", e);
                        None
                    }),
                None => None,
            },
        );

        for (name, counts) in &summary {
            match counts {
                Some(counts) => info!("{}: {}/{} passed", name, counts.passed, counts.total),
                None => info!("{}: skipped", name),
            }
        }

        let elapsed_minutes = started.elapsed().as_secs_f64() / 60.0;
        let run_summary = RunSummary {
            timestamp: Utc::now().to_rfc3339(),
            elapsed: format!("{:.1} minutes", elapsed_minutes),
            summary,
        };
        let summary_path = self
            .results_dir
            .join(format!("summary-{}.json", Utc::now().timestamp_millis()));
        std::fs::write(&summary_path, serde_json::to_string_pretty(&run_summary)?)?;
        info!("Summary saved: {}", summary_path.display());
        Ok(())
    }

    /// Blend each test case and grade the composites.
    async fn run_image_quality(
        &self,
        eval_id: &str,
        cases: &[ImageBlendCase],
    ) -> AppResult<Option<ResultCounts>> {
        info!("Running Image Quality eval ({} cases)", cases.len());

        let mut items = Vec::new();
        for case in cases {
            info!("Generating: {} - {}", case.id, case.description);
            let result = async {
                let subject = read_image(&self.datasets_dir, &case.subject)?;
                let scene = read_image(&self.datasets_dir, &case.scene)?;
                let blended = self
                    .blend
                    .blend_images(subject.clone(), scene.clone(), Some(&case.prompt))
                    .await?;
                AppResult::Ok(json!({
                    "item": {
                        "subject_image_url": bytes_to_data_url(&subject.bytes, &subject.mime),
                        "scene_image_url": bytes_to_data_url(&scene.bytes, &scene.mime),
                        "prompt": case.prompt,
                        "generated_image_url": format!("data:{};base64,{}", blended.mime, blended.base64)
                    }
                }))
            }
            .await;

            match result {
                Ok(item) => items.push(item),
                Err(e) => error!("Case {} failed: {}", case.id, e),
            }
        }

        self.submit_and_wait(eval_id, "Image Quality", "image-eval", items)
            .await
    }

    /// Generate a video per case, sample frames and grade identity drift.
    async fn run_video_identity(
        &self,
        eval_id: &str,
        cases: &[VideoIdentityCase],
    ) -> AppResult<Option<ResultCounts>> {
        info!("Running Video Identity eval ({} cases)", cases.len());

        let mut items = Vec::new();
        for case in cases {
            info!("Generating: {} - {}", case.id, case.description);
            let result = async {
                let subject = read_image(&self.datasets_dir, &case.subject)?;
                let (script, video_id) = self
                    .generate_completed_video(&subject, &case.brief, case.seconds)
                    .await?;

                let video_path = self.download_video(&video_id).await?;
                let extracted =
                    extract_frames(&video_path, DEFAULT_FRAME_COUNT, None).await?;
                let frame_urls = frames_to_data_urls(&extracted.frames).await?;
                cleanup_frames(&extracted.frames).await;
                let _ = tokio::fs::remove_file(&video_path).await;

                AppResult::Ok(json!({
                    "item": {
                        "reference_image_url": bytes_to_data_url(&subject.bytes, &subject.mime),
                        "frame_urls": frame_urls,
                        "script": script
                    }
                }))
            }
            .await;

            match result {
                Ok(item) => items.push(item),
                Err(e) => error!("Case {} failed: {}", case.id, e),
            }
        }

        self.submit_and_wait(eval_id, "Video Identity", "video-eval", items)
            .await
    }

    /// Remix a freshly generated video and check the effect landed.
    async fn run_remix_bw(
        &self,
        eval_id: &str,
        cases: &[RemixCase],
    ) -> AppResult<Option<ResultCounts>> {
        info!("Running Remix B&W eval ({} cases)", cases.len());

        let mut items = Vec::new();
        for case in cases {
            info!("Generating: {} - {}", case.id, case.description);
            let result = async {
                let subject = read_image(&self.datasets_dir, &case.subject)?;
                let (_, source_id) = self
                    .generate_completed_video(&subject, &case.brief, case.seconds)
                    .await?;

                let remix_job = self.remix.remix_video(&source_id, &case.remix_prompt).await?;
                self.wait_for_video(&remix_job.id, "Video remix").await?;

                let video_path = self.download_video(&remix_job.id).await?;
                let frame_path =
                    std::env::temp_dir().join(format!("campaign-remix-{}.png", Uuid::new_v4()));
                extract_single_frame(&video_path, FramePosition::Middle, &frame_path).await?;
                let frame_bytes = tokio::fs::read(&frame_path).await?;
                let _ = tokio::fs::remove_file(&frame_path).await;
                let _ = tokio::fs::remove_file(&video_path).await;

                AppResult::Ok(json!({
                    "item": {
                        "frame_url": bytes_to_data_url(&frame_bytes, "image/png"),
                        "remix_prompt": case.remix_prompt
                    }
                }))
            }
            .await;

            match result {
                Ok(item) => items.push(item),
                Err(e) => error!("Case {} failed: {}", case.id, e),
            }
        }

        self.submit_and_wait(eval_id, "Remix B&W", "remix-eval", items)
            .await
    }

    /// Script + video generation, waiting for the job to complete.
    async fn generate_completed_video(
        &self,
        subject: &ImagePayload,
        brief: &str,
        seconds: u32,
    ) -> AppResult<(String, String)> {
        let reference_url = bytes_to_data_url(&subject.bytes, &subject.mime);
        let script = self
            .script
            .generate_script(brief, seconds, Some(&reference_url))
            .await?
            .script;

        let validation = validate_script(&script, seconds, DEFAULT_TOLERANCE);
        if validation.valid {
            info!("{}", format_validation_result(&validation));
        } else {
            warn!("{}", format_validation_result(&validation));
        }

        let job = self.video.generate_video(&script, &subject.bytes, seconds).await?;
        self.wait_for_video(&job.id, "Video generation").await?;
        Ok((script, job.id))
    }

    async fn wait_for_video(&self, video_id: &str, label: &str) -> AppResult<()> {
        let video = &self.video;
        wait_until_terminal(
            move || async move {
                let status = video.status(video_id).await?;
                Ok(JobStatus {
                    status: status.status,
                    error: status.error,
                })
            },
            DEFAULT_POLL_INTERVAL,
            DEFAULT_POLL_BUDGET,
            label,
        )
        .await
    }

    async fn download_video(&self, video_id: &str) -> AppResult<PathBuf> {
        let bytes = self.video.content(video_id).await?;
        let path = std::env::temp_dir().join(format!("campaign-eval-{}.mp4", Uuid::new_v4()));
        tokio::fs::write(&path, &bytes).await?;
        Ok(path)
    }

    /// Upload items as JSONL, start the eval run and wait for its verdict.
    async fn submit_and_wait(
        &self,
        eval_id: &str,
        eval_name: &str,
        file_prefix: &str,
        items: Vec<Value>,
    ) -> AppResult<Option<ResultCounts>> {
        if items.is_empty() {
            warn!("{}: no items generated, skipping eval run", eval_name);
            return Ok(None);
        }

        let jsonl = jsonl_lines(&items);
        let filename = format!("{}-{}.jsonl", file_prefix, Utc::now().timestamp_millis());
        let file_id = self.client.upload_evals_file(jsonl, &filename).await?;
        info!("Uploaded {} ({})", filename, file_id);

        let run_name = format!("{} - {}", eval_name, Utc::now().to_rfc3339());
        let run = self.client.create_eval_run(eval_id, &run_name, &file_id).await?;
        info!("Run created: {}", run.id);
        if let Some(report_url) = &run.report_url {
            info!("Dashboard: {}", report_url);
        }

        let completed = self.wait_for_eval_run(eval_id, &run.id).await?;
        let counts = completed.result_counts.unwrap_or_default();
        info!("{}: {}/{} passed", eval_name, counts.passed, counts.total);
        Ok(Some(counts))
    }

    async fn wait_for_eval_run(&self, eval_id: &str, run_id: &str) -> AppResult<EvalRun> {
        let client = &*self.client;
        wait_until_terminal(
            move || async move {
                let run = client.eval_run(eval_id, run_id).await?;
                let error = run.error_message();
                Ok(JobStatus {
                    status: run.status,
                    error,
                })
            },
            DEFAULT_POLL_INTERVAL,
            DEFAULT_POLL_BUDGET,
            "Eval run",
        )
        .await?;
        self.client.eval_run(eval_id, run_id).await
    }
}

fn jsonl_lines(items: &[Value]) -> String {
    items
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
