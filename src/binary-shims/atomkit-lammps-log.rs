fn main() { atomkit_tasks::entry_points::lammps_log() }
