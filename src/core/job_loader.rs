// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use quick_xml::events::{ BytesStart, Event };
use quick_xml::Reader;

use crate::core::photon_array::PhotonArray;
use crate::math::bounds::Bounds2i;
use crate::math::constants::{ Float, Int };

/// Largest image a job may request, in pixels.
pub const MAX_IMAGE_PIXELS: usize = 1 << 28;

#[derive(Debug)]
pub enum JobLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
    UnknownList(String),
}

impl From<std::io::Error> for JobLoadError {
    fn from(err: std::io::Error) -> Self {
        JobLoadError::Io(err)
    }
}

impl From<quick_xml::Error> for JobLoadError {
    fn from(err: quick_xml::Error) -> Self {
        JobLoadError::Parse(err.to_string())
    }
}

impl fmt::Display for JobLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobLoadError::Io(err) => write!(f, "io error: {}", err),
            JobLoadError::Parse(msg) => write!(f, "parse error: {}", msg),
            JobLoadError::MissingField(field) => write!(f, "missing field: {}", field),
            JobLoadError::UnknownList(id) => write!(f, "unknown photon list: {}", id),
        }
    }
}

impl std::error::Error for JobLoadError {}

/// One operation applied to the base photon list, in file order.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStep {
    Convolve(String),
    Append(String),
    TakeY(String),
    ScaleFlux(Float),
    ScaleXY(Float),
    SetTotalFlux(Float),
    Shift(Float, Float),
}

impl PipelineStep {
    pub fn referenced_list(&self) -> Option<&str> {
        match self {
            PipelineStep::Convolve(id) | PipelineStep::Append(id) | PipelineStep::TakeY(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

pub struct Job {
    lists: Vec<(String, PhotonArray)>,
    pub base: String,
    pub seed: u64,
    pub bounds: Bounds2i,
    pub pipeline: Vec<PipelineStep>,
}

impl Job {
    pub fn list(&self, id: &str) -> Option<&PhotonArray> {
        self.lists.iter().find(|(name, _)| name == id).map(|(_, list)| list)
    }

    pub fn list_ids(&self) -> impl Iterator<Item = &str> {
        self.lists.iter().map(|(name, _)| name.as_str())
    }
}

pub fn load_job<P: AsRef<Path>>(path: P) -> Result<Job, JobLoadError> {
    let xml = fs::read_to_string(path.as_ref())?;
    let job = parse_job(&xml)?;
    log::info!("Loaded job {} with {} photon lists and {} pipeline steps.",
               path.as_ref().display(), job.lists.len(), job.pipeline.len());
    Ok(job)
}

pub fn parse_job(xml: &str) -> Result<Job, JobLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut parser = JobParser::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => parser.start(&e)?,
            Ok(Event::Empty(e)) => {
                parser.start(&e)?;
                parser.end(e.name().as_ref())?;
            }
            Ok(Event::End(e)) => parser.end(e.name().as_ref())?,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    parser.finish()
}

#[derive(Default)]
struct JobParser {
    defaults: HashMap<String, String>,
    lists: Vec<(String, PhotonArray)>,
    current_list: Option<(String, PhotonArray)>,
    in_pipeline: bool,
    pipeline: Vec<PipelineStep>,
    base: Option<String>,
    seed: Option<u64>,
    bounds: Option<Bounds2i>,
}

impl JobParser {
    fn start(&mut self, e: &BytesStart) -> Result<(), JobLoadError> {
        let attrs = self.attributes(e)?;
        match e.name().as_ref() {
            b"job" => {}
            b"default" => {
                if let (Some(k), Some(v)) = (attrs.get("name"), attrs.get("value")) {
                    self.defaults.insert(k.clone(), v.clone());
                }
            }
            b"integer" => {
                let name = required(&attrs, "name", "integer.name")?;
                let value = required(&attrs, "value", "integer.value")?;
                match name {
                    "seed" => self.seed = Some(parse_u64(value)?),
                    _ => log::warn!("Ignoring unknown integer property: {}.", name),
                }
            }
            b"string" => {
                let name = required(&attrs, "name", "string.name")?;
                let value = required(&attrs, "value", "string.value")?;
                match name {
                    "base" => self.base = Some(value.to_string()),
                    _ => log::warn!("Ignoring unknown string property: {}.", name),
                }
            }
            b"image" => {
                let xmin = parse_int(required(&attrs, "xmin", "image.xmin")?)?;
                let xmax = parse_int(required(&attrs, "xmax", "image.xmax")?)?;
                let ymin = parse_int(required(&attrs, "ymin", "image.ymin")?)?;
                let ymax = parse_int(required(&attrs, "ymax", "image.ymax")?)?;
                let bounds = Bounds2i::from_extent(xmin, xmax, ymin, ymax);
                match bounds.checked_area() {
                    Some(area) if area <= MAX_IMAGE_PIXELS => {}
                    _ => {
                        return Err(JobLoadError::Parse(format!(
                            "image of {}x{} pixels exceeds the limit of {} pixels",
                            bounds.width(), bounds.height(), MAX_IMAGE_PIXELS)));
                    }
                }
                self.bounds = Some(bounds);
            }
            b"photons" => {
                if self.current_list.is_some() {
                    return Err(JobLoadError::Parse("nested photons element".to_string()));
                }
                let id = required(&attrs, "id", "photons.id")?.to_string();
                if self.lists.iter().any(|(name, _)| *name == id) {
                    return Err(JobLoadError::Parse(format!("duplicate photon list: {}", id)));
                }
                let mut list = PhotonArray::default();
                if let Some(flag) = attrs.get("correlated") {
                    list.set_correlated(parse_bool(flag)?);
                }
                self.current_list = Some((id, list));
            }
            b"photon" => {
                let x = parse_float(required(&attrs, "x", "photon.x")?)?;
                let y = parse_float(required(&attrs, "y", "photon.y")?)?;
                let flux = parse_float(required(&attrs, "flux", "photon.flux")?)?;
                match self.current_list.as_mut() {
                    Some((_, list)) => list.push(x, y, flux),
                    None => return Err(JobLoadError::Parse("photon outside of a photons element".to_string())),
                }
            }
            b"pipeline" => self.in_pipeline = true,
            name => {
                let step = match name {
                    b"convolve" => PipelineStep::Convolve(required(&attrs, "with", "convolve.with")?.to_string()),
                    b"append" => PipelineStep::Append(required(&attrs, "from", "append.from")?.to_string()),
                    b"take_y" => PipelineStep::TakeY(required(&attrs, "from", "take_y.from")?.to_string()),
                    b"scale_flux" => PipelineStep::ScaleFlux(parse_float(required(&attrs, "value", "scale_flux.value")?)?),
                    b"scale_xy" => PipelineStep::ScaleXY(parse_float(required(&attrs, "value", "scale_xy.value")?)?),
                    b"flux" => PipelineStep::SetTotalFlux(parse_float(required(&attrs, "value", "flux.value")?)?),
                    b"shift" => PipelineStep::Shift(parse_float(required(&attrs, "x", "shift.x")?)?,
                                                    parse_float(required(&attrs, "y", "shift.y")?)?),
                    other => {
                        return Err(JobLoadError::Parse(format!("unknown element: {}", String::from_utf8_lossy(other))));
                    }
                };
                if !self.in_pipeline {
                    return Err(JobLoadError::Parse(format!("{:?} outside of the pipeline", step)));
                }
                self.pipeline.push(step);
            }
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) -> Result<(), JobLoadError> {
        match name {
            b"photons" => {
                if let Some((id, list)) = self.current_list.take() {
                    log::debug!("Photon list {}: {} photons, total flux {}.", id, list.len(), list.total_flux());
                    self.lists.push((id, list));
                }
            }
            b"pipeline" => self.in_pipeline = false,
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<Job, JobLoadError> {
        let JobParser { lists, pipeline, base, seed, bounds, .. } = self;
        let base = match base {
            Some(base) => base,
            None => lists.first()
                .map(|(id, _)| id.clone())
                .ok_or(JobLoadError::MissingField("photons"))?,
        };

        let known = |id: &str| lists.iter().any(|(name, _)| name == id);
        if !known(&base) {
            return Err(JobLoadError::UnknownList(base));
        }
        for step in pipeline.iter() {
            if let Some(id) = step.referenced_list() {
                if !known(id) {
                    return Err(JobLoadError::UnknownList(id.to_string()));
                }
            }
        }

        Ok(Job {
            lists,
            base,
            seed: seed.unwrap_or(0),
            bounds: bounds.unwrap_or_default(),
            pipeline,
        })
    }

    fn attributes(&self, e: &BytesStart) -> Result<HashMap<String, String>, JobLoadError> {
        let mut attrs = HashMap::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| JobLoadError::Parse(err.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value()?;
            attrs.insert(key, resolve_value(&value, &self.defaults));
        }
        Ok(attrs)
    }
}

fn required<'a>(attrs: &'a HashMap<String, String>, key: &str, field: &'static str) -> Result<&'a str, JobLoadError> {
    attrs.get(key).map(|v| v.as_str()).ok_or(JobLoadError::MissingField(field))
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn parse_float(value: &str) -> Result<Float, JobLoadError> {
    value.trim().parse::<Float>().map_err(|_| JobLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_int(value: &str) -> Result<Int, JobLoadError> {
    value.trim().parse::<Int>().map_err(|_| JobLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_u64(value: &str) -> Result<u64, JobLoadError> {
    value.trim().parse::<u64>().map_err(|_| JobLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_bool(value: &str) -> Result<bool, JobLoadError> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(JobLoadError::Parse(format!("invalid boolean: {}", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB: &str = r#"
<job>
    <default name="half" value="0.5"/>
    <integer name="seed" value="11"/>
    <string name="base" value="psf"/>
    <image xmin="-4" xmax="4" ymin="-2" ymax="2"/>
    <photons id="source">
        <photon x="0" y="0" flux="1.0"/>
        <photon x="1" y="0" flux="1.0"/>
    </photons>
    <photons id="psf" correlated="true">
        <photon x="0" y="0" flux="$half"/>
        <photon x="0" y="1" flux="$half"/>
    </photons>
    <photons id="empty"/>
    <pipeline>
        <convolve with="source"/>
        <scale_xy value="2"/>
        <shift x="1" y="-1"/>
        <flux value="10"/>
        <scale_flux value="$half"/>
        <take_y from="source"/>
        <append from="empty"/>
    </pipeline>
</job>
"#;

    #[test]
    fn test_parse_job() {
        let job = parse_job(JOB).expect("failed to parse job");
        assert_eq!(job.seed, 11);
        assert_eq!(job.base, "psf");
        assert_eq!(job.bounds, Bounds2i::from_extent(-4, 4, -2, 2));
        assert_eq!(job.list_ids().collect::<Vec<_>>(), vec!["source", "psf", "empty"]);

        let psf = job.list("psf").expect("psf list");
        assert!(psf.is_correlated());
        assert_eq!(psf.fluxes(), &[0.5, 0.5]);
        assert_eq!(psf.ys(), &[0.0, 1.0]);
        assert!(!job.list("source").expect("source list").is_correlated());
        assert!(job.list("empty").expect("empty list").is_empty());

        assert_eq!(job.pipeline, vec![
            PipelineStep::Convolve("source".to_string()),
            PipelineStep::ScaleXY(2.0),
            PipelineStep::Shift(1.0, -1.0),
            PipelineStep::SetTotalFlux(10.0),
            PipelineStep::ScaleFlux(0.5),
            PipelineStep::TakeY("source".to_string()),
            PipelineStep::Append("empty".to_string()),
        ]);
    }

    #[test]
    fn test_parse_job_defaults() {
        let job = parse_job(r#"<job><photons id="a"><photon x="1" y="2" flux="3"/></photons></job>"#)
            .expect("failed to parse job");
        assert_eq!(job.base, "a");
        assert_eq!(job.seed, 0);
        assert!(!job.bounds.is_defined());
        assert!(job.pipeline.is_empty());
    }

    #[test]
    fn test_parse_job_errors() {
        match parse_job("<job></job>") {
            Err(JobLoadError::MissingField("photons")) => {}
            other => panic!("unexpected result: {:?}", other.err()),
        }

        let unknown = r#"<job><photons id="a"/><pipeline><convolve with="b"/></pipeline></job>"#;
        match parse_job(unknown) {
            Err(JobLoadError::UnknownList(id)) => assert_eq!(id, "b"),
            other => panic!("unexpected result: {:?}", other.err()),
        }

        let missing_flux = r#"<job><photons id="a"><photon x="1" y="2"/></photons></job>"#;
        match parse_job(missing_flux) {
            Err(JobLoadError::MissingField("photon.flux")) => {}
            other => panic!("unexpected result: {:?}", other.err()),
        }

        let stray_step = r#"<job><photons id="a"/><scale_xy value="2"/></job>"#;
        assert!(matches!(parse_job(stray_step), Err(JobLoadError::Parse(_))));

        let bad_float = r#"<job><photons id="a"><photon x="one" y="2" flux="1"/></photons></job>"#;
        assert!(matches!(parse_job(bad_float), Err(JobLoadError::Parse(_))));

        let duplicate = r#"<job><photons id="a"/><photons id="a"/></job>"#;
        assert!(matches!(parse_job(duplicate), Err(JobLoadError::Parse(_))));
    }

    #[test]
    fn test_parse_job_rejects_oversized_image() {
        let full_range = r#"<job>
            <image xmin="-2147483648" xmax="2147483647" ymin="-2147483648" ymax="2147483647"/>
            <photons id="a"><photon x="0" y="0" flux="1"/></photons>
        </job>"#;
        assert!(matches!(parse_job(full_range), Err(JobLoadError::Parse(_))));

        let huge = r#"<job>
            <image xmin="0" xmax="99999" ymin="0" ymax="99999"/>
            <photons id="a"><photon x="0" y="0" flux="1"/></photons>
        </job>"#;
        assert!(matches!(parse_job(huge), Err(JobLoadError::Parse(_))));

        let largest = r#"<job>
            <image xmin="0" xmax="16383" ymin="0" ymax="16383"/>
            <photons id="a"><photon x="0" y="0" flux="1"/></photons>
        </job>"#;
        let job = parse_job(largest).expect("image at the limit is accepted");
        assert_eq!(job.bounds.checked_area(), Some(MAX_IMAGE_PIXELS));
    }
}
