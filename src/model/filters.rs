use serde::{Serialize, Deserialize, de::DeserializeOwned};
use serde_json::{json, Value};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
};
use crate::error::{PlayerError, PlayerResult};

/// Every filter bundle the node understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterKind {
    Equalizer,
    Karaoke,
    Timescale,
    Tremolo,
    Vibrato,
    Rotation,
    Distortion,
    ChannelMix,
    LowPass,
}

impl FilterKind {
    /// Key of the bundle inside the `filters` payload.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Equalizer => "equalizer",
            Self::Karaoke => "karaoke",
            Self::Timescale => "timescale",
            Self::Tremolo => "tremolo",
            Self::Vibrato => "vibrato",
            Self::Rotation => "rotation",
            Self::Distortion => "distortion",
            Self::ChannelMix => "channelMix",
            Self::LowPass => "lowPass",
        }
    }

    fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Equalizer => &[],
            Self::Karaoke => &["level", "monoLevel", "filterBand", "filterWidth"],
            Self::Timescale => &["speed", "pitch", "rate"],
            Self::Tremolo | Self::Vibrato => &["frequency", "depth"],
            Self::Rotation => &["rotationHz"],
            Self::Distortion => &[
                "sinOffset", "sinScale", "cosOffset", "cosScale",
                "tanOffset", "tanScale", "offset", "scale",
            ],
            Self::ChannelMix => &["leftToLeft", "leftToRight", "rightToLeft", "rightToRight"],
            Self::LowPass => &["smoothing"],
        }
    }
}

impl Display for FilterKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.key())
    }
}

/// One equalizer band.
///
/// There are 15 bands (0-14). The gain is the multiplier for the given band, valid values
/// range from -0.25 to 1.0, where -0.25 means the band is completely muted and 0.25 means it is doubled.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub band: u8,
    pub gain: f64,
}

/// Uses equalization to eliminate part of a band, usually targeting vocals.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Karaoke {
    pub level: f64,
    pub mono_level: f64,
    pub filter_band: f64,
    pub filter_width: f64,
}

/// Changes the speed, pitch and rate. All default to 1.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timescale {
    pub speed: f64,
    pub pitch: f64,
    pub rate: f64,
}

/// Oscillates the volume.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tremolo {
    pub frequency: f64,
    pub depth: f64,
}

/// Oscillates the pitch.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vibrato {
    pub frequency: f64,
    pub depth: f64,
}

/// Rotates the sound around the stereo channels, 0.2 Hz gives a slow panning effect.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rotation {
    pub rotation_hz: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distortion {
    pub sin_offset: f64,
    pub sin_scale: f64,
    pub cos_offset: f64,
    pub cos_scale: f64,
    pub tan_offset: f64,
    pub tan_scale: f64,
    pub offset: f64,
    pub scale: f64,
}

/// Mixes both channels with a factor on how much each channel affects the other.
/// Setting every factor to 0.5 makes both channels carry the same audio.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMix {
    pub left_to_left: f64,
    pub left_to_right: f64,
    pub right_to_left: f64,
    pub right_to_right: f64,
}

/// Suppresses higher frequencies.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowPass {
    pub smoothing: f64,
}

/// A single, already typed filter bundle.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterBundle {
    Equalizer(Vec<Band>),
    Karaoke(Karaoke),
    Timescale(Timescale),
    Tremolo(Tremolo),
    Vibrato(Vibrato),
    Rotation(Rotation),
    Distortion(Distortion),
    ChannelMix(ChannelMix),
    LowPass(LowPass),
}

impl FilterBundle {
    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Equalizer(_) => FilterKind::Equalizer,
            Self::Karaoke(_) => FilterKind::Karaoke,
            Self::Timescale(_) => FilterKind::Timescale,
            Self::Tremolo(_) => FilterKind::Tremolo,
            Self::Vibrato(_) => FilterKind::Vibrato,
            Self::Rotation(_) => FilterKind::Rotation,
            Self::Distortion(_) => FilterKind::Distortion,
            Self::ChannelMix(_) => FilterKind::ChannelMix,
            Self::LowPass(_) => FilterKind::LowPass,
        }
    }
}

macro_rules! bundle_from {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for FilterBundle {
                fn from(filter: $ty) -> FilterBundle {
                    FilterBundle::$ty(filter)
                }
            }

            impl From<$ty> for FilterInput {
                fn from(filter: $ty) -> FilterInput {
                    FilterInput::Bundle(FilterBundle::$ty(filter))
                }
            }
        )*
    };
}

bundle_from!(Karaoke, Timescale, Tremolo, Vibrato, Rotation, Distortion, ChannelMix, LowPass);

/// Every accepted way of describing a filter bundle.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterInput {
    /// Already typed, only the bundle kind and an empty equalizer are checked.
    Bundle(FilterBundle),
    /// Wrapped object form, `{"karaoke": {"level": 1.0, ...}}`. Every required field must be present
    /// and be a float.
    Json(Value),
    /// `(band, gain)` pairs, equalizer only.
    Bands(Vec<(u8, f64)>),
    /// A single number, accepted by rotation (`rotationHz`) and low pass (`smoothing`).
    Scalar(f64),
}

impl From<FilterBundle> for FilterInput {
    fn from(bundle: FilterBundle) -> FilterInput {
        FilterInput::Bundle(bundle)
    }
}

impl From<Vec<Band>> for FilterInput {
    fn from(bands: Vec<Band>) -> FilterInput {
        FilterInput::Bundle(FilterBundle::Equalizer(bands))
    }
}

impl From<Value> for FilterInput {
    fn from(value: Value) -> FilterInput {
        FilterInput::Json(value)
    }
}

impl From<Vec<(u8, f64)>> for FilterInput {
    fn from(levels: Vec<(u8, f64)>) -> FilterInput {
        FilterInput::Bands(levels)
    }
}

impl From<&[(u8, f64)]> for FilterInput {
    fn from(levels: &[(u8, f64)]) -> FilterInput {
        FilterInput::Bands(levels.to_vec())
    }
}

impl From<f64> for FilterInput {
    fn from(value: f64) -> FilterInput {
        FilterInput::Scalar(value)
    }
}

impl FilterInput {
    /// Turns the input into the bundle of the given kind, validating it on the way.
    pub fn normalize(self, kind: FilterKind) -> PlayerResult<FilterBundle> {
        match self {
            FilterInput::Bundle(bundle) => {
                if bundle.kind() != kind {
                    return Err(PlayerError::malformed(kind, format!("got a `{}` bundle instead", bundle.kind())));
                }

                if let FilterBundle::Equalizer(bands) = &bundle {
                    if bands.is_empty() {
                        return Err(PlayerError::malformed(kind, "the band list is empty"));
                    }
                }

                Ok(bundle)
            },
            FilterInput::Bands(levels) => {
                if kind != FilterKind::Equalizer {
                    return Err(PlayerError::malformed(kind, "band pairs are only accepted by the equalizer"));
                }

                let bands = levels.iter()
                    .map(|(band, gain)| json!({ "band": band, "gain": gain }))
                    .collect::<Vec<_>>();

                validate(kind, json!({ "equalizer": bands }))
            },
            FilterInput::Scalar(value) => match kind {
                FilterKind::Rotation => validate(kind, json!({ "rotation": { "rotationHz": value } })),
                FilterKind::LowPass => validate(kind, json!({ "lowPass": { "smoothing": value } })),
                _ => Err(PlayerError::malformed(kind, "a single number is only accepted by rotation and lowPass")),
            },
            FilterInput::Json(value) => validate(kind, value),
        }
    }
}

fn validate(kind: FilterKind, value: Value) -> PlayerResult<FilterBundle> {
    let mut wrapper = match value {
        Value::Object(map) => map,
        _ => return Err(PlayerError::malformed(kind, "expected an object")),
    };

    let inner = wrapper.remove(kind.key())
        .ok_or_else(|| PlayerError::malformed(kind, format!("missing the `{}` key", kind.key())))?;

    match kind {
        FilterKind::Equalizer => validate_bands(inner).map(FilterBundle::Equalizer),
        FilterKind::Karaoke => typed(kind, inner).map(FilterBundle::Karaoke),
        FilterKind::Timescale => typed(kind, inner).map(FilterBundle::Timescale),
        FilterKind::Tremolo => typed(kind, inner).map(FilterBundle::Tremolo),
        FilterKind::Vibrato => typed(kind, inner).map(FilterBundle::Vibrato),
        FilterKind::Rotation => typed(kind, inner).map(FilterBundle::Rotation),
        FilterKind::Distortion => typed(kind, inner).map(FilterBundle::Distortion),
        FilterKind::ChannelMix => typed(kind, inner).map(FilterBundle::ChannelMix),
        FilterKind::LowPass => typed(kind, inner).map(FilterBundle::LowPass),
    }
}

fn check_fields(kind: FilterKind, value: &Value) -> PlayerResult<()> {
    let fields = value.as_object()
        .ok_or_else(|| PlayerError::malformed(kind, "expected an object of parameters"))?;

    for field in kind.required_fields() {
        match fields.get(*field) {
            Some(value) if value.is_f64() => (),
            Some(_) => return Err(PlayerError::malformed(kind, format!("`{}` must be a float", field))),
            None => return Err(PlayerError::malformed(kind, format!("missing `{}`", field))),
        }
    }

    Ok(())
}

fn validate_bands(value: Value) -> PlayerResult<Vec<Band>> {
    let kind = FilterKind::Equalizer;

    let items = match value {
        Value::Array(items) => items,
        _ => return Err(PlayerError::malformed(kind, "expected a list of bands")),
    };

    if items.is_empty() {
        return Err(PlayerError::malformed(kind, "the band list is empty"));
    }

    items.iter()
        .enumerate()
        .map(|(index, item)| {
            let band = item.get("band")
                .and_then(Value::as_u64)
                .filter(|band| *band <= u8::MAX as u64)
                .ok_or_else(|| PlayerError::malformed(kind, format!("element {} needs an integer `band`", index)))?;

            let gain = item.get("gain")
                .and_then(Value::as_f64)
                .ok_or_else(|| PlayerError::malformed(kind, format!("element {} needs a numeric `gain`", index)))?;

            Ok(Band { band: band as u8, gain })
        })
        .collect()
}

fn typed<T: DeserializeOwned>(kind: FilterKind, value: Value) -> PlayerResult<T> {
    check_fields(kind, &value)?;

    serde_json::from_value(value).map_err(|why| PlayerError::malformed(kind, why))
}

/// Every bundle merged into the body of one `filters` message.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equalizer: Option<Vec<Band>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub karaoke: Option<Karaoke>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timescale: Option<Timescale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tremolo: Option<Tremolo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibrato: Option<Vibrato>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distortion: Option<Distortion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_mix: Option<ChannelMix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_pass: Option<LowPass>,
}

impl Filters {
    pub fn insert(&mut self, bundle: FilterBundle) {
        match bundle {
            FilterBundle::Equalizer(bands) => self.equalizer = Some(bands),
            FilterBundle::Karaoke(karaoke) => self.karaoke = Some(karaoke),
            FilterBundle::Timescale(timescale) => self.timescale = Some(timescale),
            FilterBundle::Tremolo(tremolo) => self.tremolo = Some(tremolo),
            FilterBundle::Vibrato(vibrato) => self.vibrato = Some(vibrato),
            FilterBundle::Rotation(rotation) => self.rotation = Some(rotation),
            FilterBundle::Distortion(distortion) => self.distortion = Some(distortion),
            FilterBundle::ChannelMix(mix) => self.channel_mix = Some(mix),
            FilterBundle::LowPass(low_pass) => self.low_pass = Some(low_pass),
        }
    }
}

/// Set of independently optional filter bundles sent together.
///
/// ```ignore
/// let options = FilterOptions::new()
///     .equalizer(vec![(0u8, -0.25), (1u8, 0.1)])
///     .rotation(0.2);
///
/// player.set_filters(options).await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct FilterOptions {
    inputs: BTreeMap<FilterKind, FilterInput>,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bundle for the given kind, replacing a previous one.
    pub fn with(mut self, kind: FilterKind, input: impl Into<FilterInput>) -> Self {
        self.inputs.insert(kind, input.into());
        self
    }

    pub fn equalizer(self, input: impl Into<FilterInput>) -> Self {
        self.with(FilterKind::Equalizer, input)
    }

    pub fn karaoke(self, input: impl Into<FilterInput>) -> Self {
        self.with(FilterKind::Karaoke, input)
    }

    pub fn timescale(self, input: impl Into<FilterInput>) -> Self {
        self.with(FilterKind::Timescale, input)
    }

    pub fn tremolo(self, input: impl Into<FilterInput>) -> Self {
        self.with(FilterKind::Tremolo, input)
    }

    pub fn vibrato(self, input: impl Into<FilterInput>) -> Self {
        self.with(FilterKind::Vibrato, input)
    }

    pub fn rotation(self, input: impl Into<FilterInput>) -> Self {
        self.with(FilterKind::Rotation, input)
    }

    pub fn distortion(self, input: impl Into<FilterInput>) -> Self {
        self.with(FilterKind::Distortion, input)
    }

    pub fn channel_mix(self, input: impl Into<FilterInput>) -> Self {
        self.with(FilterKind::ChannelMix, input)
    }

    pub fn low_pass(self, input: impl Into<FilterInput>) -> Self {
        self.with(FilterKind::LowPass, input)
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Validates every bundle and merges them, the first malformed bundle aborts the whole build.
    pub fn build(self) -> PlayerResult<Filters> {
        let mut filters = Filters::default();

        for (kind, input) in self.inputs {
            filters.insert(input.normalize(kind)?);
        }

        Ok(filters)
    }
}
