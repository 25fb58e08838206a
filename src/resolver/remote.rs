use std::{io::Read, path::Path};

use flate2::read::GzDecoder;
use log::info;

use super::{FetchAction, FetchError, ResolveRequest, SourceResolver};

/// Stages a remote archive by downloading it and unpacking it into the
/// staging area. Always applicable; network and unpack failures only surface
/// when the action runs.
pub struct RemoteResolver;

impl SourceResolver for RemoteResolver {
    fn resolve(&self, request: &ResolveRequest) -> Option<FetchAction> {
        let url = request.uri.remote_url();
        let staging = request.staging.clone();
        let target = staging.subdirectory_for(&request.uri.to_string());
        Some(FetchAction::new(target.clone(), move || {
            staging.create_once(&target, || download_and_unpack(&url, &target))
        }))
    }
}

fn download_and_unpack(url: &str, target: &Path) -> Result<(), FetchError> {
    info!("Downloading {}", url);
    let response = ureq::get(url).call().map_err(Box::new)?;
    let reader = response.into_body().into_reader();
    unpack_archive(reader, is_gzipped(url), target)
}

fn unpack_archive(reader: impl Read, gzipped: bool, target: &Path) -> Result<(), FetchError> {
    std::fs::create_dir_all(target)?;
    if gzipped {
        tar::Archive::new(GzDecoder::new(reader)).unpack(target)?;
    } else {
        tar::Archive::new(reader).unpack(target)?;
    }
    Ok(())
}

fn is_gzipped(url: &str) -> bool {
    url.ends_with(".gz") || url.ends_with(".tgz")
}
