use std::io::{self, Write};
use std::path::Path;

use crate::sim::Sample;

/// Write a flight record in CSV format.
///
/// Columns: time, pos_x, pos_y, pos_z, vel_x, vel_y, vel_z,
///          roll_deg, pitch_deg, yaw_deg, omega_x, omega_y, omega_z,
///          m_front, m_right, m_back, m_left, lyapunov, fext_x, fext_y, fext_z
///
/// `lyapunov` is empty when the controller does not track one.
pub fn write_trajectory<W: Write>(writer: &mut W, samples: &[Sample]) -> io::Result<()> {
    writeln!(
        writer,
        "time,pos_x,pos_y,pos_z,vel_x,vel_y,vel_z,\
         roll_deg,pitch_deg,yaw_deg,omega_x,omega_y,omega_z,\
         m_front,m_right,m_back,m_left,lyapunov,fext_x,fext_y,fext_z"
    )?;

    for sample in samples {
        let s = &sample.state;
        let m = &s.motor_speeds;
        let v = sample.lyapunov.map(|v| format!("{:.6}", v)).unwrap_or_default();
        let f = &sample.external_force;
        writeln!(
            writer,
            "{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},\
             {:.3},{:.3},{:.3},{:.5},{:.5},{:.5},\
             {:.4},{:.4},{:.4},{:.4},{},{:.4},{:.4},{:.4}",
            sample.time,
            s.position.x, s.position.y, s.position.z,
            s.velocity.x, s.velocity.y, s.velocity.z,
            s.roll().to_degrees(), s.pitch().to_degrees(), s.yaw().to_degrees(),
            s.angular_velocity.x, s.angular_velocity.y, s.angular_velocity.z,
            m[0], m[1], m[2], m[3],
            v,
            f.x, f.y, f.z,
        )?;
    }

    Ok(())
}

/// Write a flight record to a CSV file at the given path.
pub fn write_trajectory_file(path: impl AsRef<Path>, samples: &[Sample]) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_trajectory(&mut file, samples)
}
