//! Job and scheduler records.

use super::graph::{decode_link_graph, encode_link_graph};
use super::wire::{SaveReader, SaveWriter};
use crate::error::{LinkGraphError, Result};
use crate::storage::{DistributionType, LinkGraphJob, LinkGraphSchedule, LinkGraphSettings};
use crate::types::{Date, JobId, LinkGraphId};

/// Writes a job: settings, join date, owning graph index, graph snapshot.
pub fn encode_job(w: &mut SaveWriter, job: &LinkGraphJob) -> Result<()> {
    encode_settings(w, &job.settings);
    w.put_i32(job.join_date.0);
    w.put_u16(job.link_graph.0);
    encode_link_graph(w, &job.graph)
}

/// Reads a job record.
pub fn decode_job(r: &mut SaveReader<'_>) -> Result<LinkGraphJob> {
    let settings = decode_settings(r)?;
    let join_date = Date(r.get_i32()?);
    let link_graph = LinkGraphId(r.get_u16()?);
    let graph = decode_link_graph(r)?;
    Ok(LinkGraphJob {
        graph,
        link_graph,
        join_date,
        settings,
    })
}

fn encode_settings(w: &mut SaveWriter, s: &LinkGraphSettings) {
    w.put_u16(s.recalc_interval);
    w.put_u16(s.recalc_time);
    w.put_u8(s.distribution_pax.as_u8());
    w.put_u8(s.distribution_mail.as_u8());
    w.put_u8(s.distribution_armoured.as_u8());
    w.put_u8(s.distribution_default.as_u8());
    w.put_u8(s.accuracy);
    w.put_u8(s.demand_distance);
    w.put_u8(s.demand_size);
    w.put_u8(s.short_path_saturation);
}

fn decode_settings(r: &mut SaveReader<'_>) -> Result<LinkGraphSettings> {
    Ok(LinkGraphSettings {
        recalc_interval: r.get_u16()?,
        recalc_time: r.get_u16()?,
        distribution_pax: decode_distribution(r)?,
        distribution_mail: decode_distribution(r)?,
        distribution_armoured: decode_distribution(r)?,
        distribution_default: decode_distribution(r)?,
        accuracy: r.get_u8()?,
        demand_distance: r.get_u8()?,
        demand_size: r.get_u8()?,
        short_path_saturation: r.get_u8()?,
    })
}

fn decode_distribution(r: &mut SaveReader<'_>) -> Result<DistributionType> {
    let byte = r.get_u8()?;
    DistributionType::from_u8(byte)
        .ok_or_else(|| LinkGraphError::corrupt(format!("unknown distribution type {byte}")))
}

/// Writes the scheduler's queued graphs and running jobs.
pub fn encode_schedule(w: &mut SaveWriter, schedule: &LinkGraphSchedule) -> Result<()> {
    put_ref_list(w, schedule.schedule.iter().map(|id| id.0), schedule.schedule.len())?;
    put_ref_list(w, schedule.running.iter().map(|id| id.0), schedule.running.len())
}

/// Reads the scheduler record.
pub fn decode_schedule(r: &mut SaveReader<'_>) -> Result<LinkGraphSchedule> {
    let schedule = get_ref_list(r)?.into_iter().map(LinkGraphId).collect();
    let running = get_ref_list(r)?.into_iter().map(JobId).collect();
    Ok(LinkGraphSchedule { schedule, running })
}

fn put_ref_list(w: &mut SaveWriter, ids: impl Iterator<Item = u16>, len: usize) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| LinkGraphError::invalid("reference list too long"))?;
    w.put_u32(len);
    for id in ids {
        w.put_u16(id);
    }
    Ok(())
}

fn get_ref_list(r: &mut SaveReader<'_>) -> Result<Vec<u16>> {
    let len = r.get_u32()? as usize;
    if len > r.remaining() / 2 {
        return Err(LinkGraphError::corrupt("reference list longer than its chunk"));
    }
    (0..len).map(|_| r.get_u16()).collect()
}
